//! Caller-visible failures.

use serde::Serialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::limiter::AdmissionError;
use crate::qos::FatalCause;
use crate::transport::{HttpResponse, TransportError};

/// One physical attempt of a logical call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    /// 1-based attempt number within the call.
    pub attempt: u32,
    pub endpoint: String,
    pub outcome: &'static str,
    /// Response status, when a response was received.
    pub status: Option<u16>,
    pub latency_ms: u64,
}

/// Terminal classification of a failed call.
#[derive(Debug, Error)]
pub enum CallErrorKind {
    /// Connect/IO failures persisted past the retry budget.
    #[error("transport failure, retries exhausted: {0}")]
    TransportFailure(#[source] TransportError),

    /// The server kept throttling past the retry budget.
    #[error("throttled, retries exhausted")]
    Throttled,

    /// Local admission kept refusing past the retry budget.
    #[error("admission refused, retries exhausted: {0}")]
    CapacityExhausted(#[source] AdmissionError),

    /// Every known endpoint was tried and reported unavailable.
    #[error("all endpoints exhausted")]
    EndpointsExhausted,

    /// Too many endpoint switches, typically a redirect loop.
    #[error("relocation limit of {0} exceeded")]
    RelocationLimitExceeded(u32),

    /// Non-retryable response or request, surfaced unchanged.
    #[error("fatal: {cause}")]
    FatalResponse {
        cause: FatalCause,
        response: Option<Box<HttpResponse>>,
    },
}

impl CallErrorKind {
    /// Short label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            CallErrorKind::TransportFailure(_) => "transport_failure",
            CallErrorKind::Throttled => "throttled",
            CallErrorKind::CapacityExhausted(_) => "capacity_exhausted",
            CallErrorKind::EndpointsExhausted => "endpoints_exhausted",
            CallErrorKind::RelocationLimitExceeded(_) => "relocation_limit",
            CallErrorKind::FatalResponse { .. } => "fatal",
        }
    }

    /// True for the variants that are only surfaced once retries run out.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(
            self,
            CallErrorKind::TransportFailure(_)
                | CallErrorKind::Throttled
                | CallErrorKind::CapacityExhausted(_)
        )
    }
}

/// A logical call that reached the FAILED state.
#[derive(Debug, Error)]
#[error("call {call_id} failed after {attempts} attempt(s), last endpoint {last_endpoint}: {kind}")]
pub struct CallError {
    pub call_id: Uuid,
    #[source]
    pub kind: CallErrorKind,
    pub attempts: u32,
    pub last_endpoint: Url,
    pub history: Vec<AttemptRecord>,
}

impl CallError {
    pub fn kind(&self) -> &CallErrorKind {
        &self.kind
    }

    /// The response behind a fatal failure, if one was received.
    pub fn into_response(self) -> Option<HttpResponse> {
        match self.kind {
            CallErrorKind::FatalResponse { response, .. } => response.map(|r| *r),
            _ => None,
        }
    }
}
