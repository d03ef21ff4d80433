use std::fmt;

use log::debug;

use crate::errors::SyncError;
use crate::events::SyncEvent;

/// Initialization phase of a controller-managed resource
///
/// `Uninitialized → Initializing → Ready → Stale → Initializing …`, with `Error` reachable from
/// `Initializing`. Any phase returns to `Uninitialized` on disconnect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResourcePhase {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Stale,
    Error(SyncError),
}

impl fmt::Display for ResourcePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Stale => write!(f, "stale"),
            Self::Error(err) => write!(f, "error ({})", err.category()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub resource: &'static str,
    pub from: ResourcePhase,
    pub to: ResourcePhase,
}

impl From<Transition> for SyncEvent {
    fn from(transition: Transition) -> Self {
        SyncEvent::PhaseChanged {
            resource: transition.resource,
            from: transition.from,
            to: transition.to,
        }
    }
}

/// Phase plus the value produced by the last successful initialization
#[derive(Debug)]
pub struct Lifecycle<T> {
    resource: &'static str,
    phase: ResourcePhase,
    value: Option<T>,
}

impl<T> Lifecycle<T> {
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            phase: ResourcePhase::Uninitialized,
            value: None,
        }
    }

    pub fn phase(&self) -> &ResourcePhase {
        &self.phase
    }

    /// The initialized value, only while `Ready`
    pub fn ready(&self) -> Option<&T> {
        match self.phase {
            ResourcePhase::Ready => self.value.as_ref(),
            _ => None,
        }
    }

    /// Enters `Initializing` unless the resource is already initializing or ready
    pub fn begin(&mut self) -> Option<Transition> {
        match self.phase {
            ResourcePhase::Initializing | ResourcePhase::Ready => None,
            _ => self.transition(ResourcePhase::Initializing),
        }
    }

    /// Leaves `Initializing`
    ///
    /// An error is recorded in the phase itself, so a later `begin` can retry.
    pub fn complete(&mut self, result: Result<T, SyncError>) -> Option<Transition> {
        if self.phase != ResourcePhase::Initializing {
            return None;
        }
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.transition(ResourcePhase::Ready)
            }
            Err(err) => {
                self.value = None;
                self.transition(ResourcePhase::Error(err))
            }
        }
    }

    /// `Ready → Stale`; no effect in any other phase
    pub fn mark_stale(&mut self) -> Option<Transition> {
        if self.phase != ResourcePhase::Ready {
            return None;
        }
        self.value = None;
        self.transition(ResourcePhase::Stale)
    }

    pub fn reset(&mut self) -> Option<Transition> {
        self.value = None;
        self.transition(ResourcePhase::Uninitialized)
    }

    fn transition(&mut self, to: ResourcePhase) -> Option<Transition> {
        if self.phase == to {
            return None;
        }
        let from = std::mem::replace(&mut self.phase, to.clone());
        debug!("{}: {} -> {}", self.resource, from, to);
        Some(Transition {
            resource: self.resource,
            from,
            to,
        })
    }
}
