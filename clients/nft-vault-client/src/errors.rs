use std::fmt;

use anchor_lang::prelude::Pubkey;
use log::Level;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Every failure the synchronization layer reports
///
/// Fetch operations store these in the affected record's `error` field and submissions store
/// them in `TransactionState::error`. None of them escape a public fetch or submit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Malformed derivation input (null key, oversized seed, no viable bump)
    InvalidInput(String),
    /// Bad configuration, unsupported network or a failed program handle construction
    Configuration(String),
    /// The remote account does not exist
    NotFound { address: Pubkey },
    /// The account exists but is owned by an unexpected program
    OwnershipMismatch {
        address: Pubkey,
        expected: Pubkey,
        actual: Pubkey,
    },
    /// The account data does not match the expected layout
    Deserialization { address: Pubkey, reason: String },
    /// Local state (connection, selection, cached records) is incomplete
    MissingPrecondition(String),
    /// Live state says the submission would fail
    Validation(String),
    /// The wallet declined to sign
    UserRejected,
    /// Transport failure, safe to retry
    Network(String),
    /// The program rejected the transaction
    ProgramExecution(ProgramDiagnostic),
}

impl SyncError {
    /// Absence is a valid state rendered as "not yet available", not as an error banner.
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether resubmitting or refreshing can succeed without a code or config change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::MissingPrecondition(_) | Self::Validation(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Configuration(_) => "configuration",
            Self::NotFound { .. } => "not_found",
            Self::OwnershipMismatch { .. } => "ownership_mismatch",
            Self::Deserialization { .. } => "deserialization",
            Self::MissingPrecondition(_) => "missing_precondition",
            Self::Validation(_) => "validation",
            Self::UserRejected => "user_rejected",
            Self::Network(_) => "network",
            Self::ProgramExecution(_) => "program_execution",
        }
    }

    /// Log severity for this failure
    pub fn log_level(&self) -> Level {
        match self {
            Self::NotFound { .. } | Self::MissingPrecondition(_) => Level::Debug,
            Self::UserRejected | Self::Validation(_) => Level::Info,
            Self::Network(_) | Self::ProgramExecution(_) => Level::Warn,
            Self::InvalidInput(_)
            | Self::Configuration(_)
            | Self::OwnershipMismatch { .. }
            | Self::Deserialization { .. } => Level::Error,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::NotFound { address } => write!(f, "Account {address} not found"),
            Self::OwnershipMismatch {
                address,
                expected,
                actual,
            } => write!(
                f,
                "Account {address} is owned by {actual}, expected {expected}"
            ),
            Self::Deserialization { address, reason } => {
                write!(f, "Account {address} does not match the expected layout: {reason}")
            }
            Self::MissingPrecondition(msg) => write!(f, "Not ready: {msg}"),
            Self::Validation(msg) => write!(f, "Transaction would fail: {msg}"),
            Self::UserRejected => write!(f, "User rejected the request"),
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::ProgramExecution(diagnostic) => write!(f, "Program error: {diagnostic}"),
        }
    }
}

impl std::error::Error for SyncError {}

// ---------------------------------------------------------------------------
// Remote rejection payload
// ---------------------------------------------------------------------------

/// Diagnostic payload of a transaction the program rejected
///
/// When the program logs an Anchor error line the code name, number and message are parsed out
/// of it; otherwise only the raw message and logs are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramDiagnostic {
    pub message: String,
    pub logs: Vec<String>,
    pub error_name: Option<String>,
    pub error_number: Option<u32>,
    pub error_message: Option<String>,
}

impl ProgramDiagnostic {
    pub fn from_logs(message: impl Into<String>, logs: Vec<String>) -> Self {
        let mut diagnostic = Self {
            message: message.into(),
            logs,
            ..Self::default()
        };

        if let Some(line) = diagnostic
            .logs
            .iter()
            .find(|line| line.contains("Error Code: "))
        {
            diagnostic.error_name = field_after(line, "Error Code: ").map(str::to_string);
            diagnostic.error_number =
                field_after(line, "Error Number: ").and_then(|n| n.trim().parse().ok());
            diagnostic.error_message = line
                .split_once("Error Message: ")
                .map(|(_, rest)| rest.trim().trim_end_matches('.').to_string());
        }

        diagnostic
    }
}

impl fmt::Display for ProgramDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error_name, &self.error_message) {
            (Some(name), Some(msg)) => write!(f, "{name}: {msg}"),
            (Some(name), None) => write!(f, "{name}"),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Text following `label` up to the next ". " separator.
fn field_after<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let (_, rest) = line.split_once(label)?;
    let end = rest.find(". ").unwrap_or(rest.len());
    Some(rest[..end].trim_end_matches('.'))
}
