use std::fmt;

use solana_sdk::signature::Signature;

use crate::errors::SyncError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TxStatus {
    #[default]
    Idle,
    Building,
    Signing,
    Confirming,
    Success,
    Failed,
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Building | Self::Signing | Self::Confirming)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Signing => "signing",
            Self::Confirming => "confirming",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One submission attempt, created fresh by every `submit`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionState {
    pub status: TxStatus,
    pub signature: Option<Signature>,
    pub error: Option<SyncError>,
    /// Human-readable status line
    pub message: String,
    /// Statuses entered since `Idle`, in order
    pub history: Vec<TxStatus>,
}

/// User action the pipeline can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultAction {
    /// Deposit raw units of the vault's deposit mint
    Deposit { amount: u64 },
    /// Redeem shares from the selected NFT's position
    Withdraw { shares: u64 },
}

impl fmt::Display for VaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit { amount } => write!(f, "deposit of {amount}"),
            Self::Withdraw { shares } => write!(f, "withdrawal of {shares} shares"),
        }
    }
}
