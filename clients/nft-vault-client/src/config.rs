use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use serde::Deserialize;

use crate::constants::DEFAULT_NETWORKS;
use crate::errors::SyncError;

/// Token program used for every associated token account derivation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum TokenProgram {
    #[default]
    #[serde(rename = "spl-token")]
    SplToken,
    #[serde(rename = "token-2022")]
    Token2022,
}

impl TokenProgram {
    pub fn id(&self) -> Pubkey {
        match self {
            Self::SplToken => anchor_spl::token::ID,
            Self::Token2022 => anchor_spl::token_2022::ID,
        }
    }
}

/// Static configuration of the synchronization layer
///
/// ```toml
/// program_id = "DzCPo8cX1693KBkyZWaXQzzNLYzyQnUTwX4XLR9qLiPg"
/// token_program = "spl-token"
/// supported_networks = ["devnet"]
/// compute_unit_limit = 200000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Base58 vault program identifier
    pub program_id: String,
    pub token_program: TokenProgram,
    /// Network identifiers the controller will initialize against
    pub supported_networks: Vec<String>,
    /// When set, submissions prepend a compute unit limit instruction
    pub compute_unit_limit: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            program_id: crate::ID.to_string(),
            token_program: TokenProgram::default(),
            supported_networks: DEFAULT_NETWORKS.iter().map(|n| n.to_string()).collect(),
            compute_unit_limit: None,
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, SyncError> {
        toml::from_str(source).map_err(|e| SyncError::Configuration(e.to_string()))
    }

    pub fn program_id(&self) -> Result<Pubkey, SyncError> {
        Pubkey::from_str(&self.program_id).map_err(|_| {
            SyncError::Configuration(format!("invalid program id: {}", self.program_id))
        })
    }

    pub fn supports_network(&self, network: &str) -> bool {
        self.supported_networks.iter().any(|n| n == network)
    }
}
