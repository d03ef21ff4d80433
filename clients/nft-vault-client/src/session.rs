use std::cell::RefCell;
use std::collections::HashMap;

use anchor_lang::prelude::Pubkey;

use crate::derivation::PositionAddresses;
use crate::errors::SyncError;
use crate::events::{ClearReason, EventLog, SyncEvent};
use crate::state::{Collection, UserInfo, VaultState};
use crate::store::RecordStore;

/// Identity of one position request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub wallet: Pubkey,
    pub nft_mint: Pubkey,
}

/// Display value of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionValue {
    pub shares: u64,
    /// Deposit tokens the shares represent, or the raw share count when `proportional` is false
    pub underlying: u64,
    pub proportional: bool,
}

/// A fetched position together with the addresses it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub addresses: PositionAddresses,
    pub info: UserInfo,
    pub value: PositionValue,
}

/// One row of the all-positions list; `position` is `None` when the NFT has no deposit yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionEntry {
    pub nft_mint: Pubkey,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    pub account: Pubkey,
    /// Raw token units
    pub amount: u64,
}

/// User-chosen inputs that live outside the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub token_mint: Option<Pubkey>,
    pub token_account: Option<Pubkey>,
    pub nft_mint: Option<Pubkey>,
}

/// The three selections every submission needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredSelections {
    pub token_mint: Pubkey,
    pub token_account: Pubkey,
    pub nft_mint: Pubkey,
}

impl SelectionState {
    pub fn has_required_selections(&self) -> bool {
        self.token_mint.is_some() && self.token_account.is_some() && self.nft_mint.is_some()
    }

    /// The complete selection, or `MissingPrecondition` naming what is missing
    pub fn required(&self) -> Result<RequiredSelections, SyncError> {
        match (self.token_mint, self.token_account, self.nft_mint) {
            (Some(token_mint), Some(token_account), Some(nft_mint)) => Ok(RequiredSelections {
                token_mint,
                token_account,
                nft_mint,
            }),
            _ => {
                let missing = [
                    (self.token_mint.is_none(), "token mint"),
                    (self.token_account.is_none(), "token account"),
                    (self.nft_mint.is_none(), "NFT"),
                ]
                .iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, name)| *name)
                .collect::<Vec<_>>()
                .join(", ");
                Err(SyncError::MissingPrecondition(format!("select a {missing}")))
            }
        }
    }
}

/// Process-local state for one wallet session
///
/// Created at session start and passed by reference to the controller and the submission
/// pipeline. Each domain gets its own store so a failure in one never touches another.
#[derive(Debug)]
pub struct Session {
    pub vault: RecordStore<Pubkey, VaultState>,
    pub collection: RecordStore<Pubkey, Collection>,
    pub position: RecordStore<PositionKey, Position>,
    /// All positions of a wallet, keyed by wallet address
    pub positions: RecordStore<Pubkey, Vec<PositionEntry>>,
    pub token: RecordStore<Pubkey, TokenBalance>,
    selection: RefCell<SelectionState>,
    /// Addresses each committed position read used, absences included
    position_sources: RefCell<HashMap<PositionKey, PositionAddresses>>,
    events: EventLog,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            vault: RecordStore::new("vault"),
            collection: RecordStore::new("collection"),
            position: RecordStore::new("position"),
            positions: RecordStore::new("positions"),
            token: RecordStore::new("token"),
            selection: RefCell::new(SelectionState::default()),
            position_sources: RefCell::new(HashMap::new()),
            events: EventLog::default(),
        }
    }

    pub fn selection(&self) -> SelectionState {
        *self.selection.borrow()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Addresses the last committed read of `key` came from
    ///
    /// Present for absent positions too, which carry no data of their own.
    pub fn position_source(&self, key: &PositionKey) -> Option<PositionAddresses> {
        self.position_sources.borrow().get(key).copied()
    }

    /// Drained into the UI by presentation code
    ///
    /// The log keeps the most recent `EVENT_LOG_CAPACITY` events; older ones are dropped when a
    /// host does not drain it.
    pub fn drain_events(&self) -> Vec<SyncEvent> {
        self.events.drain()
    }

    pub(crate) fn update_selection(&self, update: impl FnOnce(&mut SelectionState)) {
        update(&mut self.selection.borrow_mut());
    }

    pub(crate) fn record_position_source(&self, key: PositionKey, addresses: PositionAddresses) {
        self.position_sources.borrow_mut().insert(key, addresses);
    }

    pub(crate) fn emit(&self, event: SyncEvent) {
        self.events.push(event);
    }

    /// Empties every store and the selection
    pub(crate) fn clear_all(&self, reason: ClearReason) {
        self.vault.clear();
        self.collection.clear();
        self.position.clear();
        self.positions.clear();
        self.token.clear();
        self.position_sources.borrow_mut().clear();
        *self.selection.borrow_mut() = SelectionState::default();
        self.emit(SyncEvent::SessionCleared { reason });
    }

    pub(crate) fn invalidate_all(&self) {
        self.vault.invalidate_all();
        self.collection.invalidate_all();
        self.position.invalidate_all();
        self.positions.invalidate_all();
        self.token.invalidate_all();
        for store in [
            self.vault.name(),
            self.collection.name(),
            self.position.name(),
            self.positions.name(),
            self.token.name(),
        ] {
            self.emit(SyncEvent::CacheInvalidated { store });
        }
    }
}
