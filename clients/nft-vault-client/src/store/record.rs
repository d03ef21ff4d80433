use crate::errors::SyncError;

/// Last known representation of a remote account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord<K, T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<SyncError>,
    /// Identity of the request that produced `data` or `error`
    pub last_fetched_at_key: Option<K>,
    /// Set by explicit invalidation; the next read must re-fetch
    pub is_stale: bool,
}

impl<K, T> Default for RemoteRecord<K, T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            last_fetched_at_key: None,
            is_stale: false,
        }
    }
}

impl<K, T> RemoteRecord<K, T> {
    pub fn has_been_fetched(&self) -> bool {
        self.last_fetched_at_key.is_some()
    }

    /// Fetched, not invalidated, and not carrying a real failure
    ///
    /// A confirmed absence counts as fresh; a transient failure does not, so the next natural
    /// trigger retries it.
    pub fn is_fresh(&self) -> bool {
        self.has_been_fetched()
            && !self.is_stale
            && self.error.as_ref().map_or(true, SyncError::is_absence)
    }

    /// Fetched and found not to exist; rendered as an empty state
    pub fn is_absent(&self) -> bool {
        self.has_been_fetched()
            && self.data.is_none()
            && self.error.as_ref().map_or(true, SyncError::is_absence)
    }

    /// A real failure worth an inline alert
    pub fn alert(&self) -> Option<&SyncError> {
        self.error.as_ref().filter(|err| !err.is_absence())
    }
}
