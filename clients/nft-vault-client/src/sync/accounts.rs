use anchor_lang::prelude::Pubkey;
use anchor_lang::AccountDeserialize;
use solana_sdk::account::Account;

use crate::errors::SyncError;
use crate::rpc::LedgerRpc;

/// Fetches and decodes a program-owned account
///
/// One `get_account` call, then the owner check, then decoding. Absence is `Ok(None)`; the
/// caller decides whether that is an error for its resource.
pub async fn fetch_account<T, R>(
    rpc: &R,
    address: &Pubkey,
    expected_owner: &Pubkey,
) -> Result<Option<T>, SyncError>
where
    T: AccountDeserialize,
    R: LedgerRpc,
{
    let Some(account) = rpc.get_account(address).await? else {
        return Ok(None);
    };
    check_owner(address, &account, expected_owner)?;
    decode_account(address, &account).map(Some)
}

pub fn check_owner(
    address: &Pubkey,
    account: &Account,
    expected_owner: &Pubkey,
) -> Result<(), SyncError> {
    if account.owner != *expected_owner {
        return Err(SyncError::OwnershipMismatch {
            address: *address,
            expected: *expected_owner,
            actual: account.owner,
        });
    }
    Ok(())
}

/// Decodes discriminator-prefixed account data
pub fn decode_account<T: AccountDeserialize>(
    address: &Pubkey,
    account: &Account,
) -> Result<T, SyncError> {
    T::try_deserialize(&mut account.data.as_slice()).map_err(|e| SyncError::Deserialization {
        address: *address,
        reason: e.to_string(),
    })
}
