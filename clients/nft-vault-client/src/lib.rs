//! Client-side synchronization layer for the NFT share vault.
//!
//! The vault program itself is opaque to this crate. What lives here is the plumbing a front end
//! needs around it:
//! - Tracking wallet, network and program readiness as an explicit state machine
//!   (`SyncController`, `ResourcePhase`).
//! - Deriving every program-derived and associated token address from one seed table
//!   (`constants::seeds`, `derivation`).
//! - Caching remote account state with existence, ownership and staleness guards (`store`,
//!   `Session`).
//! - Sequencing deposit and withdraw submissions through build, sign and confirm
//!   (`SubmissionPipeline`).
//!
//! # Concurrency
//! Everything runs on a single cooperative task. Stores use interior mutability and never hold a
//! borrow across an `.await`, so overlapping refreshes interleave safely and are deduplicated per
//! key by the in-flight guard.

use anchor_lang::prelude::*;

// Program ID declaration
declare_id!("DzCPo8cX1693KBkyZWaXQzzNLYzyQnUTwX4XLR9qLiPg");

pub mod config;
pub mod connection;
pub mod constants;
pub mod derivation;
pub mod errors;
pub mod events;
pub mod interface;
pub mod rpc;
pub mod session;
pub mod state;
pub mod store;
pub mod sync;
pub mod transaction;
pub mod utils;

pub use config::{SyncConfig, TokenProgram};
pub use connection::{ConnectionContext, ConnectionEvent, ConnectionState, SignerError, WalletSigner};
pub use errors::{ProgramDiagnostic, SyncError};
pub use rpc::{LedgerRpc, RpcError};
pub use session::{PositionKey, SelectionState, Session};
pub use sync::{FetchOutcome, ResourcePhase, SyncController};
pub use transaction::{SubmissionPipeline, TransactionState, TxStatus, VaultAction};
