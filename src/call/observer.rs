//! Attempt hooks and the opaque per-call context.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use url::Url;
use uuid::Uuid;

use crate::call::AttemptRecord;

/// Caller-supplied handle threaded through a call without interpretation.
#[derive(Clone, Default)]
pub struct CallContext(Option<Arc<dyn Any + Send + Sync>>);

impl CallContext {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|value| value.downcast_ref::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CallContext")
            .field(&if self.0.is_some() { "<opaque>" } else { "<empty>" })
            .finish()
    }
}

/// An attempt about to be sent.
#[derive(Debug, Clone)]
pub struct AttemptStart<'a> {
    pub call_id: Uuid,
    pub attempt: u32,
    pub url: &'a str,
    pub endpoint: &'a Url,
}

/// Span-tracking hooks. Both methods default to no-ops.
pub trait CallObserver: Send + Sync {
    fn attempt_started(&self, _context: &CallContext, _start: &AttemptStart<'_>) {}

    fn attempt_finished(&self, _context: &CallContext, _record: &AttemptRecord) {}
}

/// Observes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {}

/// Emits one tracing event per attempt boundary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn attempt_started(&self, _context: &CallContext, start: &AttemptStart<'_>) {
        tracing::debug!(call_id = %start.call_id, attempt = start.attempt, url = %start.url, "Attempt started");
    }

    fn attempt_finished(&self, _context: &CallContext, record: &AttemptRecord) {
        tracing::debug!(
            attempt = record.attempt,
            endpoint = %record.endpoint,
            outcome = record.outcome,
            status = ?record.status,
            latency_ms = record.latency_ms,
            "Attempt finished"
        );
    }
}
