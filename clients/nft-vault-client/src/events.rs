use std::cell::RefCell;
use std::collections::VecDeque;

use solana_sdk::signature::Signature;

use crate::errors::SyncError;
use crate::sync::ResourcePhase;
use crate::transaction::TxStatus;

/// Why a session's cached state was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    Disconnected,
    AccountChanged,
    NetworkChanged,
    NetworkLost,
}

/// Notifications for presentation code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    PhaseChanged {
        resource: &'static str,
        from: ResourcePhase,
        to: ResourcePhase,
    },
    RecordCommitted {
        store: &'static str,
    },
    RecordFailed {
        store: &'static str,
        error: SyncError,
    },
    StaleResultDiscarded {
        store: &'static str,
    },
    CacheInvalidated {
        store: &'static str,
    },
    SessionCleared {
        reason: ClearReason,
    },
    TransactionStatusChanged {
        status: TxStatus,
        signature: Option<Signature>,
    },
}

/// Events kept when a host stops draining
pub const EVENT_LOG_CAPACITY: usize = 256;

/// Bounded event buffer drained by the UI; the oldest event goes first when full
#[derive(Debug, Default)]
pub struct EventLog {
    events: RefCell<VecDeque<SyncEvent>>,
}

impl EventLog {
    pub fn push(&self, event: SyncEvent) {
        let mut events = self.events.borrow_mut();
        if events.len() == EVENT_LOG_CAPACITY {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub fn drain(&self) -> Vec<SyncEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn snapshot(&self) -> Vec<SyncEvent> {
        self.events.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}
