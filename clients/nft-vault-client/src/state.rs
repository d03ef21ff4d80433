use anchor_lang::prelude::*;

/// Pooled-deposit accounting record owned by the vault program
///
/// Singleton at the `vault` PDA. The client only reads it: the mints feed address derivation and
/// the share totals feed the proportional position value.
#[account]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct VaultState {
    /// Authority allowed to administer the vault
    pub authority: Pubkey,
    /// Fungible token accepted for deposits
    pub deposit_mint: Pubkey,
    /// Mint of the vault share token
    pub share_mint: Pubkey,
    /// NFT collection whose members may hold positions
    pub collection: Pubkey,
    /// Shares outstanding across all positions
    pub total_shares: u64,
    /// Deposit tokens received over the vault lifetime
    pub total_deposited: u64,
    /// PDA bump seed for account derivation
    pub bump: u8,
}

/// Per-NFT position record
///
/// Lives at the `user_info` PDA derived from the holder's NFT token account and the share
/// authority's token account.
#[account]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub owner: Pubkey,
    pub nft_mint: Pubkey,
    /// Vault shares credited to this position
    pub shares: u64,
    /// Deposit tokens contributed by this position
    pub deposited: u64,
    pub last_update: i64,
    pub bump: u8,
}

/// NFT collection description with its mint to id mapping
#[account]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct Collection {
    pub authority: Pubkey,
    pub collection_mint: Pubkey,
    #[max_len(32)]
    pub name: String,
    #[max_len(256)]
    pub items: Vec<CollectionItem>,
    pub bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionItem {
    pub mint: Pubkey,
    pub id: u32,
}

impl Collection {
    pub fn id_of(&self, mint: &Pubkey) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.mint == *mint)
            .map(|item| item.id)
    }

    pub fn mint_of(&self, id: u32) -> Option<Pubkey> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.mint)
    }
}
