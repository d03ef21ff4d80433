pub mod address_set;

pub use address_set::*;

use anchor_lang::prelude::Pubkey;
use anchor_spl::associated_token::get_associated_token_address_with_program_id;

use crate::constants::{MAX_SEEDS, MAX_SEED_LEN};
use crate::errors::SyncError;

/// Derives the program address for `seed` followed by `inputs`
///
/// Pure function of its arguments. Fails with `InvalidInput` on a null key, an empty or oversized
/// seed, too many inputs, or when no bump yields an off-curve address.
///
/// # Returns
/// The derived address and its canonical bump
pub fn derive(program_id: &Pubkey, seed: &[u8], inputs: &[&Pubkey]) -> Result<(Pubkey, u8), SyncError> {
    require_key("program id", program_id)?;
    if seed.is_empty() || seed.len() > MAX_SEED_LEN {
        return Err(SyncError::InvalidInput(format!(
            "seed must be 1..={MAX_SEED_LEN} bytes, got {}",
            seed.len()
        )));
    }
    // One slot stays reserved for the bump
    if inputs.len() + 1 >= MAX_SEEDS {
        return Err(SyncError::InvalidInput(format!(
            "too many seed inputs: {}",
            inputs.len()
        )));
    }
    for input in inputs {
        require_key("seed input", input)?;
    }

    let mut seeds: Vec<&[u8]> = Vec::with_capacity(inputs.len() + 1);
    seeds.push(seed);
    seeds.extend(inputs.iter().map(|key| key.as_ref()));

    Pubkey::try_find_program_address(&seeds, program_id).ok_or_else(|| {
        SyncError::InvalidInput(format!(
            "no viable bump for seed {:?}",
            String::from_utf8_lossy(seed)
        ))
    })
}

/// Associated token account holding `mint` for `owner`
///
/// `owner` may itself be a derived address; that is how program-owned share accounts are chained.
pub fn associated_token_account(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Result<Pubkey, SyncError> {
    require_key("token account owner", owner)?;
    require_key("mint", mint)?;
    require_key("token program", token_program)?;
    Ok(get_associated_token_address_with_program_id(
        owner,
        mint,
        token_program,
    ))
}

fn require_key(what: &str, key: &Pubkey) -> Result<(), SyncError> {
    if *key == Pubkey::default() {
        return Err(SyncError::InvalidInput(format!("{what} is the null key")));
    }
    Ok(())
}
