pub mod record;

pub use record::RemoteRecord;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, trace};
use tokio::sync::Notify;

use crate::errors::SyncError;

/// Proof that the caller holds the in-flight guard for `key`
///
/// Handed out by `RecordStore::begin_fetch` and consumed by `commit` or `fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket<K> {
    key: K,
    epoch: u64,
    revision: u64,
}

impl<K: Copy> FetchTicket<K> {
    pub fn key(&self) -> K {
        self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The result no longer matches what the store wants and was dropped
    Discarded,
}

#[derive(Debug)]
struct Inner<K, T> {
    records: HashMap<K, RemoteRecord<K, T>>,
    in_flight: HashSet<K>,
    /// Key the consumer currently cares about; results for any other key are dropped
    desired: Option<K>,
    /// Bumped by `clear` so results from before a reset are recognized
    epoch: u64,
    /// Bumped per key by `invalidate` so results requested before it are recognized
    revisions: HashMap<K, u64>,
}

/// Keyed cache of remote records for one logical domain
///
/// Holds at most one materialized record, the one under the desired key. Fetch results pass
/// through two guards before they land: the in-flight guard (one fetch per key) and the stale
/// result guard (the key must still be desired and nothing may have reset or invalidated the
/// store since the fetch began).
///
/// Presentation code may only read. The `pub(crate)` mutators belong to the controller and the
/// submission pipeline.
#[derive(Debug)]
pub struct RecordStore<K, T> {
    name: &'static str,
    inner: RefCell<Inner<K, T>>,
    /// Woken whenever an in-flight guard is released
    settled: Notify,
}

impl<K, T> RecordStore<K, T>
where
    K: Copy + Eq + Hash + Debug,
    T: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RefCell::new(Inner {
                records: HashMap::new(),
                in_flight: HashSet::new(),
                desired: None,
                epoch: 0,
                revisions: HashMap::new(),
            }),
            settled: Notify::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current record for `key`; a never-fetched key yields the empty default
    pub fn get(&self, key: &K) -> RemoteRecord<K, T> {
        self.inner
            .borrow()
            .records
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn data(&self, key: &K) -> Option<T> {
        self.inner
            .borrow()
            .records
            .get(key)
            .and_then(|record| record.data.clone())
    }

    pub fn desired(&self) -> Option<K> {
        self.inner.borrow().desired
    }

    /// Record under the desired key, if any key is desired
    pub fn current(&self) -> Option<RemoteRecord<K, T>> {
        self.desired().map(|key| self.get(&key))
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.inner.borrow().in_flight.contains(key)
    }

    /// True when a read of `key` should go to the network
    pub fn needs_fetch(&self, key: &K) -> bool {
        let inner = self.inner.borrow();
        if inner.in_flight.contains(key) {
            return false;
        }
        inner
            .records
            .get(key)
            .map_or(true, |record| !record.is_fresh())
    }

    /// Resolves once no fetch for `key` is in flight
    pub(crate) async fn wait_settled(&self, key: &K) {
        loop {
            // Registered before the check so a release in between still wakes it
            let settled = self.settled.notified();
            if !self.is_in_flight(key) {
                return;
            }
            settled.await;
        }
    }

    /// Marks `key` stale; returns whether a record was present
    pub(crate) fn invalidate(&self, key: &K) -> bool {
        let mut inner = self.inner.borrow_mut();
        *inner.revisions.entry(*key).or_insert(0) += 1;
        match inner.records.get_mut(key) {
            Some(record) => {
                record.is_stale = true;
                debug!("{}: invalidated {:?}", self.name, key);
                true
            }
            None => false,
        }
    }

    pub(crate) fn invalidate_all(&self) {
        let mut inner = self.inner.borrow_mut();
        let Inner {
            records,
            in_flight,
            revisions,
            ..
        } = &mut *inner;
        for key in records.keys().chain(in_flight.iter()) {
            *revisions.entry(*key).or_insert(0) += 1;
        }
        for record in records.values_mut() {
            record.is_stale = true;
        }
        debug!("{}: invalidated all records", self.name);
    }

    /// Drops every record, guard and desired key
    ///
    /// Fetches still in flight will find a newer epoch on completion and be discarded.
    pub(crate) fn clear(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.records.clear();
            inner.in_flight.clear();
            inner.revisions.clear();
            inner.desired = None;
            inner.epoch += 1;
            debug!("{}: cleared (epoch {})", self.name, inner.epoch);
        }
        self.settled.notify_waiters();
    }

    /// Switches the key the consumer cares about, evicting records for any other key
    pub(crate) fn set_desired(&self, key: Option<K>) {
        let mut inner = self.inner.borrow_mut();
        if inner.desired == key {
            return;
        }
        inner.desired = key;
        inner.records.retain(|k, _| Some(*k) == key);
        trace!("{}: desired key now {:?}", self.name, key);
    }

    /// Takes the in-flight guard for `key`
    ///
    /// Returns `None` when a fetch for the same key is already running.
    pub(crate) fn begin_fetch(&self, key: K) -> Option<FetchTicket<K>> {
        let mut inner = self.inner.borrow_mut();
        if !inner.in_flight.insert(key) {
            trace!("{}: fetch for {:?} already in flight", self.name, key);
            return None;
        }
        let revision = inner.revisions.get(&key).copied().unwrap_or(0);
        let epoch = inner.epoch;
        if inner.desired == Some(key) {
            inner.records.entry(key).or_default().is_loading = true;
        }
        Some(FetchTicket {
            key,
            epoch,
            revision,
        })
    }

    /// Commits a successful fetch; `None` records a confirmed absence
    pub(crate) fn commit(&self, ticket: FetchTicket<K>, data: Option<T>) -> CommitOutcome {
        self.settle(ticket, |record| {
            record.data = data;
            record.error = None;
            record.is_stale = false;
        })
    }

    /// Records a failed fetch
    ///
    /// Previously good data survives unless the failure is an absence.
    pub(crate) fn fail(&self, ticket: FetchTicket<K>, error: SyncError) -> CommitOutcome {
        self.settle(ticket, |record| {
            if error.is_absence() {
                record.data = None;
                record.is_stale = false;
            }
            record.error = Some(error);
        })
    }

    fn settle(
        &self,
        ticket: FetchTicket<K>,
        apply: impl FnOnce(&mut RemoteRecord<K, T>),
    ) -> CommitOutcome {
        let outcome = self.apply_result(ticket, apply);
        self.settled.notify_waiters();
        outcome
    }

    fn apply_result(
        &self,
        ticket: FetchTicket<K>,
        apply: impl FnOnce(&mut RemoteRecord<K, T>),
    ) -> CommitOutcome {
        let mut inner = self.inner.borrow_mut();
        if ticket.epoch != inner.epoch {
            // Guard already released by `clear`
            debug!("{}: dropped result for {:?} from a cleared session", self.name, ticket.key);
            return CommitOutcome::Discarded;
        }
        inner.in_flight.remove(&ticket.key);

        let revision = inner.revisions.get(&ticket.key).copied().unwrap_or(0);
        if inner.desired != Some(ticket.key) || revision != ticket.revision {
            if let Some(record) = inner.records.get_mut(&ticket.key) {
                record.is_loading = false;
            }
            debug!("{}: discarded stale result for {:?}", self.name, ticket.key);
            return CommitOutcome::Discarded;
        }

        let record = inner.records.entry(ticket.key).or_default();
        apply(record);
        record.is_loading = false;
        record.last_fetched_at_key = Some(ticket.key);
        CommitOutcome::Committed
    }
}
