use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;

use anchor_lang::prelude::Pubkey;
use log::{debug, info, log};

use crate::config::SyncConfig;
use crate::connection::{ConnectionEvent, ConnectionState};
use crate::derivation::ProgramAddresses;
use crate::errors::SyncError;
use crate::events::{ClearReason, SyncEvent};
use crate::rpc::LedgerRpc;
use crate::session::{PositionKey, Session};
use crate::store::{CommitOutcome, FetchTicket, RecordStore};
use crate::sync::lifecycle::{Lifecycle, ResourcePhase, Transition};

/// Result of one refresh request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh data or a confirmed absence landed in the store
    Committed,
    /// The fetch failed; the error is in the record
    Failed(SyncError),
    /// The result arrived after its key stopped being the desired one
    Discarded,
    /// A fetch for the same key was already running
    InFlight,
    /// Preconditions for fetching (ready program, wallet, selection) are not met
    NotReady,
}

/// Outcomes of a full `refresh_all` pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub vault: FetchOutcome,
    pub collection: FetchOutcome,
    pub token: FetchOutcome,
    pub position: FetchOutcome,
}

/// Keeps session state consistent with the wallet connection and the user's selection
///
/// Drives the program handle through its `ResourcePhase` lifecycle, decides which keys each store
/// wants, and runs the guarded refreshes. Fetches are gated on the program being `Ready`.
pub struct SyncController<'s, R> {
    config: &'s SyncConfig,
    rpc: &'s R,
    session: &'s Session,
    connection: RefCell<ConnectionState>,
    program: RefCell<Lifecycle<ProgramAddresses>>,
}

impl<'s, R: LedgerRpc> SyncController<'s, R> {
    pub fn new(config: &'s SyncConfig, rpc: &'s R, session: &'s Session) -> Self {
        Self {
            config,
            rpc,
            session,
            connection: RefCell::new(ConnectionState::disconnected()),
            program: RefCell::new(Lifecycle::new("program")),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        self.config
    }

    pub fn rpc(&self) -> &R {
        self.rpc
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection.borrow().clone()
    }

    pub fn phase(&self) -> ResourcePhase {
        self.program.borrow().phase().clone()
    }

    /// Feeds a new wallet state directly, for hosts that poll instead of subscribing
    pub fn observe(&self, next: ConnectionState) -> Vec<ConnectionEvent> {
        let events = ConnectionEvent::between(&self.connection.borrow(), &next);
        for event in &events {
            self.on_connection_event(event, &next);
        }
        // Also keeps fields that changed without producing an event
        *self.connection.borrow_mut() = next;
        events
    }

    /// Handles one connection change; intended as a `ConnectionContext` listener
    pub fn on_connection_event(&self, event: &ConnectionEvent, state: &ConnectionState) {
        *self.connection.borrow_mut() = state.clone();
        debug!("connection event: {:?}", event);

        match event {
            ConnectionEvent::Disconnected => {
                let transition = self.program.borrow_mut().reset();
                self.record(transition);
                self.session.clear_all(ClearReason::Disconnected);
            }
            ConnectionEvent::AccountChanged { .. } => {
                self.restart(ClearReason::AccountChanged);
            }
            ConnectionEvent::NetworkChanged { .. } => {
                self.restart(ClearReason::NetworkChanged);
            }
            ConnectionEvent::Connected { .. } | ConnectionEvent::ReadinessChanged { ready: true } => {
                self.try_initialize();
            }
            ConnectionEvent::ReadinessChanged { ready: false } => {
                let transition = self.program.borrow_mut().mark_stale();
                if transition.is_some() {
                    self.record(transition);
                    self.session.clear_all(ClearReason::NetworkLost);
                }
            }
        }
    }

    /// Initializes the program handle if the connection allows it
    ///
    /// A no-op when already `Ready`. A failure leaves the resource in `Error`, from which the next
    /// call retries.
    pub fn ensure_initialized(&self) -> Result<(), SyncError> {
        let connection = self.connection();
        if !connection.is_ready() {
            return Err(SyncError::MissingPrecondition(
                "wallet is not connected or the network is not ready".into(),
            ));
        }

        let Some(transition) = self.program.borrow_mut().begin() else {
            return Ok(());
        };
        self.record(Some(transition));

        let result = self.initialize(&connection);
        let transition = self.program.borrow_mut().complete(result.clone());
        self.record(transition);

        match result {
            Ok(addresses) => {
                self.session.vault.set_desired(Some(addresses.vault));
                self.session.collection.set_desired(Some(addresses.collection));
                info!(
                    "program {} ready on {}",
                    addresses.program_id,
                    connection.network.as_deref().unwrap_or_default()
                );
                Ok(())
            }
            Err(err) => {
                log!(err.log_level(), "program initialization failed: {err}");
                Err(err)
            }
        }
    }

    /// `Ready → Stale` on user request; all records are invalidated and initialization reruns
    pub fn request_refresh(&self) -> Result<(), SyncError> {
        let transition = self.program.borrow_mut().mark_stale();
        self.record(transition);
        self.session.invalidate_all();
        self.ensure_initialized()
    }

    /// Singleton addresses of a `Ready` program
    pub fn ready_program(&self) -> Result<ProgramAddresses, SyncError> {
        self.program
            .borrow()
            .ready()
            .copied()
            .ok_or_else(|| SyncError::MissingPrecondition("program is not initialized".into()))
    }

    pub fn wallet(&self) -> Result<Pubkey, SyncError> {
        self.connection
            .borrow()
            .address
            .ok_or_else(|| SyncError::MissingPrecondition("wallet is not connected".into()))
    }

    pub fn select_token(&self, mint: Pubkey, account: Pubkey) {
        self.session.update_selection(|selection| {
            selection.token_mint = Some(mint);
            selection.token_account = Some(account);
        });
        self.session.token.set_desired(Some(account));
    }

    /// Selects the NFT whose position is materialized
    ///
    /// A fetch still running for the previous NFT will be discarded on arrival.
    pub fn select_nft(&self, nft_mint: Pubkey) -> Result<(), SyncError> {
        let wallet = self.wallet()?;
        self.session
            .update_selection(|selection| selection.nft_mint = Some(nft_mint));
        self.session
            .position
            .set_desired(Some(PositionKey { wallet, nft_mint }));
        Ok(())
    }

    /// Selects an NFT by its collection id
    pub fn select_nft_by_id(&self, id: u32) -> Result<Pubkey, SyncError> {
        let program = self.ready_program()?;
        let collection = self.session.collection.data(&program.collection).ok_or_else(|| {
            SyncError::MissingPrecondition("collection is not loaded".into())
        })?;
        let nft_mint = collection
            .mint_of(id)
            .ok_or_else(|| SyncError::InvalidInput(format!("no NFT with id {id} in collection")))?;
        self.select_nft(nft_mint)?;
        Ok(nft_mint)
    }

    pub fn clear_selection(&self) {
        self.session
            .update_selection(|selection| *selection = Default::default());
        self.session.position.set_desired(None);
        self.session.token.set_desired(None);
    }

    /// Refreshes every resource that has a desired key, one after another
    pub async fn refresh_all(&self) -> RefreshSummary {
        RefreshSummary {
            vault: self.refresh_vault().await,
            collection: self.refresh_collection().await,
            token: self.refresh_token_balance().await,
            position: self.refresh_position().await,
        }
    }

    /// Commits a fetch result into `store` and reports it
    pub(crate) fn settle<K, T>(
        &self,
        store: &RecordStore<K, T>,
        ticket: FetchTicket<K>,
        result: Result<Option<T>, SyncError>,
    ) -> FetchOutcome
    where
        K: Copy + Eq + Hash + Debug,
        T: Clone,
    {
        let name = store.name();
        match result {
            Ok(data) => match store.commit(ticket, data) {
                CommitOutcome::Committed => {
                    debug!("{name}: committed {:?}", ticket.key());
                    self.session.emit(SyncEvent::RecordCommitted { store: name });
                    FetchOutcome::Committed
                }
                CommitOutcome::Discarded => {
                    self.session
                        .emit(SyncEvent::StaleResultDiscarded { store: name });
                    FetchOutcome::Discarded
                }
            },
            Err(err) => {
                log!(err.log_level(), "{name}: fetch for {:?} failed: {err}", ticket.key());
                match store.fail(ticket, err.clone()) {
                    CommitOutcome::Committed => {
                        self.session.emit(SyncEvent::RecordFailed {
                            store: name,
                            error: err.clone(),
                        });
                        FetchOutcome::Failed(err)
                    }
                    CommitOutcome::Discarded => {
                        self.session
                            .emit(SyncEvent::StaleResultDiscarded { store: name });
                        FetchOutcome::Discarded
                    }
                }
            }
        }
    }

    fn initialize(&self, connection: &ConnectionState) -> Result<ProgramAddresses, SyncError> {
        let network = connection.network.as_deref().unwrap_or_default();
        if !self.config.supports_network(network) {
            return Err(SyncError::Configuration(format!(
                "unsupported network: {network}"
            )));
        }
        let program_id = self.config.program_id()?;
        ProgramAddresses::derive(&program_id, &self.config.token_program.id())
    }

    /// Account or network switch: everything cached belongs to the old context
    fn restart(&self, reason: ClearReason) {
        let transition = self.program.borrow_mut().mark_stale();
        self.record(transition);
        self.session.clear_all(reason);
        self.try_initialize();
    }

    fn try_initialize(&self) {
        if !self.connection.borrow().is_ready() {
            return;
        }
        // Failures are already logged and recorded in the phase
        let _ = self.ensure_initialized();
    }

    fn record(&self, transition: Option<Transition>) {
        if let Some(transition) = transition {
            self.session.emit(transition.into());
        }
    }
}
