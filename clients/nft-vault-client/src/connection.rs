use std::fmt;

use anchor_lang::prelude::Pubkey;
use solana_sdk::transaction::Transaction;

use crate::errors::SyncError;

/// What the wallet capability currently reports
///
/// Owned by the wallet provider. The core only observes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub address: Option<Pubkey>,
    pub is_connected: bool,
    pub network: Option<String>,
    /// True once the network is resolved and supported by the wallet
    pub is_network_ready: bool,
    /// True when a signing handle is available
    pub can_sign: bool,
}

impl ConnectionState {
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// A fully ready connection
    pub fn connected(address: Pubkey, network: impl Into<String>) -> Self {
        Self {
            address: Some(address),
            is_connected: true,
            network: Some(network.into()),
            is_network_ready: true,
            can_sign: true,
        }
    }

    /// Wallet connected, network resolved and a signer available
    pub fn is_ready(&self) -> bool {
        self.is_connected
            && self.address.is_some()
            && self.network.is_some()
            && self.is_network_ready
            && self.can_sign
    }
}

/// Change between two consecutive connection states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected { address: Pubkey },
    Disconnected,
    AccountChanged { previous: Pubkey, current: Pubkey },
    NetworkChanged {
        previous: Option<String>,
        current: Option<String>,
    },
    ReadinessChanged { ready: bool },
}

impl ConnectionEvent {
    /// Events that describe the move from `previous` to `next`, in the order they should be handled
    pub fn between(previous: &ConnectionState, next: &ConnectionState) -> Vec<Self> {
        let mut events = Vec::new();

        if previous.is_connected && !next.is_connected {
            events.push(Self::Disconnected);
            return events;
        }

        if !previous.is_connected && next.is_connected {
            if let Some(address) = next.address {
                events.push(Self::Connected { address });
            }
        } else if next.is_connected {
            if let (Some(previous), Some(current)) = (previous.address, next.address) {
                if previous != current {
                    events.push(Self::AccountChanged { previous, current });
                }
            }
            if previous.network != next.network {
                events.push(Self::NetworkChanged {
                    previous: previous.network.clone(),
                    current: next.network.clone(),
                });
            }
        }

        if previous.is_ready() != next.is_ready() {
            events.push(Self::ReadinessChanged {
                ready: next.is_ready(),
            });
        }

        events
    }
}

type Listener<'l> = Box<dyn Fn(&ConnectionEvent, &ConnectionState) + 'l>;

/// Publishes wallet provider updates to subscribers
///
/// The wallet adapter calls `publish` whenever the provider reports a new state; subscribers
/// receive each resulting `ConnectionEvent` together with the new state.
pub struct ConnectionContext<'l> {
    state: ConnectionState,
    listeners: Vec<Listener<'l>>,
}

impl<'l> Default for ConnectionContext<'l> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'l> ConnectionContext<'l> {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::disconnected(),
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn subscribe(&mut self, listener: impl Fn(&ConnectionEvent, &ConnectionState) + 'l) {
        self.listeners.push(Box::new(listener));
    }

    pub fn publish(&mut self, next: ConnectionState) -> Vec<ConnectionEvent> {
        let events = ConnectionEvent::between(&self.state, &next);
        self.state = next;
        for event in &events {
            for listener in &self.listeners {
                listener(event, &self.state);
            }
        }
        events
    }
}

// ---------------------------------------------------------------------------
// Signing capability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// The user declined the prompt
    Rejected,
    /// The wallet could not be reached or failed to sign
    Unavailable(String),
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "Signature request rejected"),
            Self::Unavailable(msg) => write!(f, "Wallet unavailable: {msg}"),
        }
    }
}

impl From<SignerError> for SyncError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Rejected => SyncError::UserRejected,
            SignerError::Unavailable(msg) => SyncError::Network(msg),
        }
    }
}

/// Transaction-signing handle exposed by the wallet provider
#[allow(async_fn_in_trait)]
pub trait WalletSigner {
    fn pubkey(&self) -> Pubkey;

    /// Suspends until the wallet responds. Rejection is a normal outcome.
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, SignerError>;
}
