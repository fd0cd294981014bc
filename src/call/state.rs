//! Call state machine types.
//!
//! ```text
//! INIT → ATTEMPTING → SUCCEEDED
//!                   → FAILED
//!                   → RELOCATING  → ATTEMPTING
//!                   → BACKING_OFF → ATTEMPTING
//! ```

use std::time::Duration;

use url::Url;
use uuid::Uuid;

use crate::call::{AttemptRecord, CallErrorKind};
use crate::endpoints::EndpointSelector;
use crate::resilience::Backoff;
use crate::transport::HttpResponse;

/// Where a relocation should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationTarget {
    /// Next untried endpoint (after 503).
    Next,
    /// Explicit redirect target.
    Redirect(Url),
}

#[derive(Debug)]
pub enum CallState {
    Init,
    Attempting,
    Relocating {
        target: RelocationTarget,
        delay: Option<Duration>,
    },
    BackingOff {
        delay: Duration,
    },
    Succeeded(HttpResponse),
    Failed(CallErrorKind),
}

impl CallState {
    pub fn name(&self) -> &'static str {
        match self {
            CallState::Init => "INIT",
            CallState::Attempting => "ATTEMPTING",
            CallState::Relocating { .. } => "RELOCATING",
            CallState::BackingOff { .. } => "BACKING_OFF",
            CallState::Succeeded(_) => "SUCCEEDED",
            CallState::Failed(_) => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Succeeded(_) | CallState::Failed(_))
    }
}

/// Mutable bookkeeping owned by one in-flight call.
#[derive(Debug)]
pub struct CallAttemptState {
    pub call_id: Uuid,
    /// Attempts started so far.
    pub attempts: u32,
    /// Request target below the current endpoint's base URL.
    pub path_and_query: String,
    pub selector: EndpointSelector,
    pub backoff: Backoff,
    pub history: Vec<AttemptRecord>,
}

impl CallAttemptState {
    pub fn new(path_and_query: String, selector: EndpointSelector, backoff: Backoff) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            attempts: 0,
            path_and_query,
            selector,
            backoff,
            history: Vec::new(),
        }
    }

    /// Retries consumed from the backoff policy.
    pub fn retries(&self) -> u32 {
        self.backoff.position()
    }

    pub fn relocations(&self) -> u32 {
        self.selector.relocations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!CallState::Init.is_terminal());
        assert!(!CallState::BackingOff { delay: Duration::ZERO }.is_terminal());
        assert!(CallState::Failed(CallErrorKind::EndpointsExhausted).is_terminal());
        assert_eq!(CallState::Attempting.name(), "ATTEMPTING");
    }
}
