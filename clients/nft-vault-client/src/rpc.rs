use std::fmt;

use anchor_lang::prelude::Pubkey;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::errors::{ProgramDiagnostic, SyncError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// Request did not complete (timeout, connection reset, bad response)
    Transport(String),
    /// The transaction reached the ledger and failed
    Rejected { message: String, logs: Vec<String> },
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "RPC transport error: {msg}"),
            Self::Rejected { message, .. } => write!(f, "Transaction rejected: {message}"),
        }
    }
}

impl From<RpcError> for SyncError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Transport(msg) => SyncError::Network(msg),
            RpcError::Rejected { message, logs } => {
                SyncError::ProgramExecution(ProgramDiagnostic::from_logs(message, logs))
            }
        }
    }
}

/// Request/response client for the remote ledger
///
/// Supplied by the host application; timeouts and retries belong to the transport.
#[allow(async_fn_in_trait)]
pub trait LedgerRpc {
    /// Raw account with its owner, or `None` when it does not exist
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, RpcError>;

    /// Raw token amount held by a token account, or `None` when it does not exist
    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<Option<u64>, RpcError>;

    async fn latest_blockhash(&self) -> Result<Hash, RpcError>;

    /// Submits a signed transaction and waits for confirmation
    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, RpcError>;
}
