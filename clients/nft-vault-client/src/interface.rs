use anchor_lang::prelude::{AnchorDeserialize, AnchorSerialize, Pubkey};
use solana_sdk::hash::hash;
use solana_sdk::instruction::{AccountMeta, Instruction};

use crate::constants::{methods, INSTRUCTION_NAMESPACE};
use crate::derivation::NamedAddresses;
use crate::errors::SyncError;

/// Account slot names used by the vault program interface
pub mod slots {
    pub const USER: &str = "user";
    pub const VAULT: &str = "vault";
    pub const NFT_MINT: &str = "nft_mint";
    pub const USER_NFT_TOKEN_ACCOUNT: &str = "user_nft_token_account";
    pub const DEPOSIT_MINT: &str = "deposit_mint";
    pub const USER_TOKEN_ACCOUNT: &str = "user_token_account";
    pub const VAULT_TOKEN_ACCOUNT: &str = "vault_token_account";
    pub const SHARE_MINT: &str = "share_mint";
    pub const USER_SHARES: &str = "user_shares";
    pub const USER_SHARES_TOKEN_ACCOUNT: &str = "user_shares_token_account";
    pub const USER_INFO: &str = "user_info";
    pub const TOKEN_PROGRAM: &str = "token_program";
    pub const ASSOCIATED_TOKEN_PROGRAM: &str = "associated_token_program";
    pub const SYSTEM_PROGRAM: &str = "system_program";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    /// Signs and pays
    Signer,
    Writable,
    Readonly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSlot {
    pub name: &'static str,
    pub role: AccountRole,
}

const fn slot(name: &'static str, role: AccountRole) -> AccountSlot {
    AccountSlot { name, role }
}

/// One program method: its name and the ordered account slots it requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: &'static str,
    pub accounts: &'static [AccountSlot],
}

/// Static description of the vault program
///
/// Only used to know which named addresses a method needs and in what order; business rules stay
/// on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramInterface {
    pub methods: &'static [MethodSpec],
}

pub const DEPOSIT: MethodSpec = MethodSpec {
    name: methods::DEPOSIT,
    accounts: &[
        slot(slots::USER, AccountRole::Signer),
        slot(slots::VAULT, AccountRole::Writable),
        slot(slots::NFT_MINT, AccountRole::Readonly),
        slot(slots::USER_NFT_TOKEN_ACCOUNT, AccountRole::Readonly),
        slot(slots::DEPOSIT_MINT, AccountRole::Readonly),
        slot(slots::USER_TOKEN_ACCOUNT, AccountRole::Writable),
        slot(slots::VAULT_TOKEN_ACCOUNT, AccountRole::Writable),
        slot(slots::SHARE_MINT, AccountRole::Writable),
        slot(slots::USER_SHARES, AccountRole::Readonly),
        slot(slots::USER_SHARES_TOKEN_ACCOUNT, AccountRole::Writable),
        slot(slots::USER_INFO, AccountRole::Writable),
        slot(slots::TOKEN_PROGRAM, AccountRole::Readonly),
        slot(slots::ASSOCIATED_TOKEN_PROGRAM, AccountRole::Readonly),
        slot(slots::SYSTEM_PROGRAM, AccountRole::Readonly),
    ],
};

pub const WITHDRAW: MethodSpec = MethodSpec {
    name: methods::WITHDRAW,
    accounts: &[
        slot(slots::USER, AccountRole::Signer),
        slot(slots::VAULT, AccountRole::Writable),
        slot(slots::NFT_MINT, AccountRole::Readonly),
        slot(slots::USER_NFT_TOKEN_ACCOUNT, AccountRole::Readonly),
        slot(slots::DEPOSIT_MINT, AccountRole::Readonly),
        slot(slots::USER_TOKEN_ACCOUNT, AccountRole::Writable),
        slot(slots::VAULT_TOKEN_ACCOUNT, AccountRole::Writable),
        slot(slots::SHARE_MINT, AccountRole::Writable),
        slot(slots::USER_SHARES, AccountRole::Readonly),
        slot(slots::USER_SHARES_TOKEN_ACCOUNT, AccountRole::Writable),
        slot(slots::USER_INFO, AccountRole::Writable),
        slot(slots::TOKEN_PROGRAM, AccountRole::Readonly),
    ],
};

pub const VAULT_INTERFACE: ProgramInterface = ProgramInterface {
    methods: &[DEPOSIT, WITHDRAW],
};

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositArgs {
    pub amount: u64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawArgs {
    pub shares: u64,
}

impl ProgramInterface {
    pub fn method(&self, name: &str) -> Result<&'static MethodSpec, SyncError> {
        self.methods
            .iter()
            .find(|method| method.name == name)
            .ok_or_else(|| SyncError::Configuration(format!("unknown program method: {name}")))
    }
}

impl MethodSpec {
    /// First 8 bytes of `sha256("global:<name>")`
    pub fn discriminator(&self) -> [u8; 8] {
        let preimage = format!("{}:{}", INSTRUCTION_NAMESPACE, self.name);
        let digest = hash(preimage.as_bytes());
        let mut disc = [0u8; 8];
        disc.copy_from_slice(&digest.to_bytes()[..8]);
        disc
    }

    /// Builds the instruction from the slot list; every slot must be present in `addresses`.
    pub fn build<A: AnchorSerialize>(
        &self,
        program_id: &Pubkey,
        addresses: &NamedAddresses,
        args: &A,
    ) -> Result<Instruction, SyncError> {
        let accounts = self
            .accounts
            .iter()
            .map(|slot| {
                let key = addresses.get(slot.name).copied().ok_or_else(|| {
                    SyncError::MissingPrecondition(format!(
                        "{} requires the {} address",
                        self.name, slot.name
                    ))
                })?;
                Ok(match slot.role {
                    AccountRole::Signer => AccountMeta::new(key, true),
                    AccountRole::Writable => AccountMeta::new(key, false),
                    AccountRole::Readonly => AccountMeta::new_readonly(key, false),
                })
            })
            .collect::<Result<Vec<_>, SyncError>>()?;

        let mut data = self.discriminator().to_vec();
        args.serialize(&mut data)
            .map_err(|e| SyncError::InvalidInput(format!("cannot encode {} args: {e}", self.name)))?;

        Ok(Instruction {
            program_id: *program_id,
            accounts,
            data,
        })
    }
}
