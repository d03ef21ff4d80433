use anchor_lang::prelude::Pubkey;

/// PDA seeds shared by the fetch path and the submit path
pub mod seeds {
    /// Seed for the vault singleton account
    pub const VAULT: &[u8] = b"vault";

    /// Seed for the NFT collection singleton account
    pub const COLLECTION: &[u8] = b"collection";

    /// Seed for the per-NFT share authority, followed by the NFT mint
    pub const USER_SHARES: &[u8] = b"user_shares";

    /// Seed for the position record, followed by the NFT token account and the shares token account
    pub const USER_INFO: &[u8] = b"user_info";
}

/// Vault program method names
pub mod methods {
    pub const DEPOSIT: &str = "deposit";
    pub const WITHDRAW: &str = "withdraw";
}

/// Namespace Anchor hashes together with a method name to build the instruction discriminator
pub const INSTRUCTION_NAMESPACE: &str = "global";

/// Maximum length in bytes of a single PDA seed
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds in one derivation, bump included
pub const MAX_SEEDS: usize = 16;

/// System program (11111111111111111111111111111111)
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// Networks accepted when no configuration overrides them
pub const DEFAULT_NETWORKS: &[&str] = &["devnet", "mainnet-beta"];
