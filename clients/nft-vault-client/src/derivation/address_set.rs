use std::collections::BTreeMap;

use anchor_lang::prelude::Pubkey;

use super::{associated_token_account, derive};
use crate::constants::{seeds, SYSTEM_PROGRAM_ID};
use crate::errors::SyncError;
use crate::interface::slots;
use crate::state::VaultState;

/// Addresses a method call names, keyed by interface slot name
pub type NamedAddresses = BTreeMap<&'static str, Pubkey>;

/// Singleton addresses fixed by the program identifier alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramAddresses {
    pub program_id: Pubkey,
    pub token_program: Pubkey,
    pub vault: Pubkey,
    pub vault_bump: u8,
    pub collection: Pubkey,
}

impl ProgramAddresses {
    pub fn derive(program_id: &Pubkey, token_program: &Pubkey) -> Result<Self, SyncError> {
        let (vault, vault_bump) = derive(program_id, seeds::VAULT, &[])?;
        let (collection, _) = derive(program_id, seeds::COLLECTION, &[])?;
        Ok(Self {
            program_id: *program_id,
            token_program: *token_program,
            vault,
            vault_bump,
            collection,
        })
    }
}

/// Addresses that depend on the fetched vault record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultAddresses {
    pub vault: Pubkey,
    pub deposit_mint: Pubkey,
    pub share_mint: Pubkey,
    /// Pooled deposit balance, the vault's associated account for the deposit mint
    pub vault_token_account: Pubkey,
}

impl VaultAddresses {
    pub fn derive(program: &ProgramAddresses, vault: &VaultState) -> Result<Self, SyncError> {
        let vault_token_account =
            associated_token_account(&program.vault, &vault.deposit_mint, &program.token_program)?;
        Ok(Self {
            vault: program.vault,
            deposit_mint: vault.deposit_mint,
            share_mint: vault.share_mint,
            vault_token_account,
        })
    }
}

/// The derivation chain behind one NFT position
///
/// `user_nft_token_account` → `user_shares` (from the NFT mint) → `user_shares_token_account`
/// (owned by `user_shares`) → `user_info` (from the two token accounts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionAddresses {
    pub wallet: Pubkey,
    pub nft_mint: Pubkey,
    pub user_nft_token_account: Pubkey,
    pub user_shares: Pubkey,
    pub user_shares_token_account: Pubkey,
    pub user_info: Pubkey,
}

impl PositionAddresses {
    pub fn derive(
        program: &ProgramAddresses,
        wallet: &Pubkey,
        nft_mint: &Pubkey,
        share_mint: &Pubkey,
    ) -> Result<Self, SyncError> {
        let user_nft_token_account =
            associated_token_account(wallet, nft_mint, &program.token_program)?;
        let (user_shares, _) = derive(&program.program_id, seeds::USER_SHARES, &[nft_mint])?;
        let user_shares_token_account =
            associated_token_account(&user_shares, share_mint, &program.token_program)?;
        let (user_info, _) = derive(
            &program.program_id,
            seeds::USER_INFO,
            &[&user_nft_token_account, &user_shares_token_account],
        )?;

        Ok(Self {
            wallet: *wallet,
            nft_mint: *nft_mint,
            user_nft_token_account,
            user_shares,
            user_shares_token_account,
            user_info,
        })
    }
}

/// Every address a deposit or withdraw call can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionAddresses {
    pub program: ProgramAddresses,
    pub vault: VaultAddresses,
    pub position: PositionAddresses,
    /// The user's selected fungible token account
    pub user_token_account: Pubkey,
}

impl TransactionAddresses {
    pub fn derive(
        program: &ProgramAddresses,
        vault: &VaultState,
        wallet: &Pubkey,
        nft_mint: &Pubkey,
        user_token_account: &Pubkey,
    ) -> Result<Self, SyncError> {
        if *user_token_account == Pubkey::default() {
            return Err(SyncError::InvalidInput(
                "user token account is the null key".into(),
            ));
        }
        Ok(Self {
            program: *program,
            vault: VaultAddresses::derive(program, vault)?,
            position: PositionAddresses::derive(program, wallet, nft_mint, &vault.share_mint)?,
            user_token_account: *user_token_account,
        })
    }

    pub fn named(&self) -> NamedAddresses {
        let p = &self.position;
        let v = &self.vault;
        BTreeMap::from([
            (slots::USER, p.wallet),
            (slots::VAULT, v.vault),
            (slots::NFT_MINT, p.nft_mint),
            (slots::USER_NFT_TOKEN_ACCOUNT, p.user_nft_token_account),
            (slots::DEPOSIT_MINT, v.deposit_mint),
            (slots::USER_TOKEN_ACCOUNT, self.user_token_account),
            (slots::VAULT_TOKEN_ACCOUNT, v.vault_token_account),
            (slots::SHARE_MINT, v.share_mint),
            (slots::USER_SHARES, p.user_shares),
            (slots::USER_SHARES_TOKEN_ACCOUNT, p.user_shares_token_account),
            (slots::USER_INFO, p.user_info),
            (slots::TOKEN_PROGRAM, self.program.token_program),
            (
                slots::ASSOCIATED_TOKEN_PROGRAM,
                anchor_spl::associated_token::ID,
            ),
            (slots::SYSTEM_PROGRAM, SYSTEM_PROGRAM_ID),
        ])
    }
}
