//! Metrics server lifecycle states.

use crate::error::LifecycleError;
use std::fmt;

/// State of a [`MetricsServer`](crate::server::MetricsServer).
///
/// `Created → Bound → Serving → Stopped`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, no socket yet
    Created,
    /// Socket bound, not yet accepting
    Bound,
    /// Accepting connections
    Serving,
    /// Shut down
    Stopped,
}

impl LifecycleState {
    /// Validate a transition to `next`, returning `next` when allowed.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] for any transition other
    /// than `Created → Bound`, `Bound → Serving` or `Serving → Stopped`.
    pub fn transition(self, next: Self) -> Result<Self, LifecycleError> {
        match (self, next) {
            (Self::Created, Self::Bound)
            | (Self::Bound, Self::Serving)
            | (Self::Serving, Self::Stopped) => Ok(next),
            (from, to) => Err(LifecycleError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Bound => "bound",
            Self::Serving => "serving",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
