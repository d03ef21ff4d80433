use crate::errors::SyncError;
use crate::rpc::LedgerRpc;
use crate::state::VaultState;
use crate::sync::accounts::fetch_account;
use crate::sync::{FetchOutcome, SyncController};

impl<'s, R: LedgerRpc> SyncController<'s, R> {
    /// Fetches the vault singleton into the vault store
    ///
    /// A missing account is reported as `NotFound`, an account owned by another program as
    /// `OwnershipMismatch` and undecodable data as `Deserialization`.
    pub async fn refresh_vault(&self) -> FetchOutcome {
        let Ok(program) = self.ready_program() else {
            return FetchOutcome::NotReady;
        };
        let store = &self.session().vault;
        let Some(ticket) = store.begin_fetch(program.vault) else {
            return FetchOutcome::InFlight;
        };

        let result = fetch_account::<VaultState, R>(self.rpc(), &program.vault, &program.program_id)
            .await
            .and_then(|vault| match vault {
                Some(vault) => Ok(Some(vault)),
                None => Err(SyncError::NotFound {
                    address: program.vault,
                }),
            });
        self.settle(store, ticket, result)
    }

    /// Cached vault record, if loaded and not invalidated
    pub fn fresh_vault(&self) -> Option<VaultState> {
        let program = self.ready_program().ok()?;
        let record = self.session().vault.get(&program.vault);
        if record.is_fresh() {
            record.data
        } else {
            None
        }
    }
}
