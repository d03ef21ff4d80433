use anchor_lang::prelude::Pubkey;
use log::warn;

use crate::derivation::{PositionAddresses, ProgramAddresses, VaultAddresses};
use crate::errors::SyncError;
use crate::rpc::LedgerRpc;
use crate::session::{Position, PositionEntry, PositionKey, PositionValue};
use crate::state::{UserInfo, VaultState};
use crate::sync::accounts::fetch_account;
use crate::sync::{FetchOutcome, SyncController};
use crate::utils::proportional_value;

impl<'s, R: LedgerRpc> SyncController<'s, R> {
    /// Fetches the position of the selected NFT
    ///
    /// An NFT without a deposit commits as `data: None` with no error. The share mint feeds the
    /// position chain, so the vault record must be fresh first: a vault fetch already running is
    /// awaited, and a missing or stale vault is refreshed.
    pub async fn refresh_position(&self) -> FetchOutcome {
        let Ok(program) = self.ready_program() else {
            return FetchOutcome::NotReady;
        };
        let store = &self.session().position;
        let Some(key) = store.desired() else {
            return FetchOutcome::NotReady;
        };
        let Some(ticket) = store.begin_fetch(key) else {
            return FetchOutcome::InFlight;
        };

        let (source, result) = match self.load_position(&program, &key).await {
            Ok((addresses, position)) => (Some(addresses), Ok(position)),
            Err(err) => (None, Err(err)),
        };
        let outcome = self.settle(store, ticket, result);
        if let (FetchOutcome::Committed, Some(addresses)) = (&outcome, source) {
            self.session().record_position_source(key, addresses);
        }
        outcome
    }

    /// Fetches the positions of every NFT in `nft_mints` into a list keyed by the wallet
    pub async fn refresh_all_positions(&self, nft_mints: &[Pubkey]) -> FetchOutcome {
        let (Ok(program), Ok(wallet)) = (self.ready_program(), self.wallet()) else {
            return FetchOutcome::NotReady;
        };
        let store = &self.session().positions;
        store.set_desired(Some(wallet));
        let Some(ticket) = store.begin_fetch(wallet) else {
            return FetchOutcome::InFlight;
        };

        let mut entries = Vec::with_capacity(nft_mints.len());
        for nft_mint in nft_mints {
            let key = PositionKey {
                wallet,
                nft_mint: *nft_mint,
            };
            match self.load_position(&program, &key).await {
                Ok((_, position)) => entries.push(PositionEntry {
                    nft_mint: *nft_mint,
                    position,
                }),
                Err(err) => return self.settle(store, ticket, Err(err)),
            }
        }
        self.settle(store, ticket, Ok(Some(entries)))
    }

    async fn load_position(
        &self,
        program: &ProgramAddresses,
        key: &PositionKey,
    ) -> Result<(PositionAddresses, Option<Position>), SyncError> {
        let vault = self.vault_for_position(program).await?;
        let addresses =
            PositionAddresses::derive(program, &key.wallet, &key.nft_mint, &vault.share_mint)?;

        let Some(info) =
            fetch_account::<UserInfo, R>(self.rpc(), &addresses.user_info, &program.program_id)
                .await?
        else {
            return Ok((addresses, None));
        };

        let value = self.position_value(program, &vault, info.shares).await;
        Ok((
            addresses,
            Some(Position {
                addresses,
                info,
                value,
            }),
        ))
    }

    /// Fresh vault record for the position chain
    ///
    /// A failed vault refresh fails the position with the vault's error; retained data from before
    /// an invalidation is never used.
    async fn vault_for_position(&self, program: &ProgramAddresses) -> Result<VaultState, SyncError> {
        let store = &self.session().vault;
        if store.is_in_flight(&program.vault) {
            store.wait_settled(&program.vault).await;
        } else if !store.get(&program.vault).is_fresh() {
            self.refresh_vault().await;
        }

        let record = store.get(&program.vault);
        let not_loaded = || SyncError::MissingPrecondition("vault record is not loaded".into());
        if record.is_fresh() {
            return record.data.ok_or_else(not_loaded);
        }
        Err(record.alert().cloned().unwrap_or_else(not_loaded))
    }

    /// Proportional share of the pooled deposit balance
    ///
    /// The pool balance is a separate fetch; when it fails, or the vault has no shares
    /// outstanding, the raw share count is shown instead.
    async fn position_value(
        &self,
        program: &ProgramAddresses,
        vault: &VaultState,
        shares: u64,
    ) -> PositionValue {
        let raw = PositionValue {
            shares,
            underlying: shares,
            proportional: false,
        };

        let pool = match VaultAddresses::derive(program, vault) {
            Ok(addresses) => addresses.vault_token_account,
            Err(err) => {
                warn!("cannot derive vault token account: {err}; showing raw shares");
                return raw;
            }
        };

        match self.rpc().get_token_account_balance(&pool).await {
            Ok(Some(pool_balance)) => {
                match proportional_value(shares, pool_balance, vault.total_shares) {
                    Some(underlying) => PositionValue {
                        shares,
                        underlying,
                        proportional: true,
                    },
                    None => {
                        warn!(
                            "vault reports {} total shares; showing raw shares",
                            vault.total_shares
                        );
                        raw
                    }
                }
            }
            Ok(None) => {
                warn!("vault token account {pool} not found; showing raw shares");
                raw
            }
            Err(err) => {
                warn!("pool balance fetch failed: {err}; showing raw shares");
                raw
            }
        }
    }
}
