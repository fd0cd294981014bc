//! Drives one logical call through its state machine.
//!
//! # Responsibilities
//! - Acquire a permit before every attempt and report the result to the limiter
//! - Classify each attempt and pick the next state
//! - Wait out backoff delays and relocate between endpoints
//! - Build the caller-visible success or failure with the attempt history
//!
//! # Design Decisions
//! - Attempts are strictly sequential; the limiter report lands before the next state
//! - Explicit server signals override policy defaults: `Retry-After` replaces
//!   the policy delay, but still consumes a retry slot
//! - 503 relocates to an untried endpoint without a retry slot; redirects
//!   relocate immediately
//! - Retry and relocation budgets are independent; exhausting either fails the call
//! - Every wait is a Tokio timer, so dropping the call future cancels it

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use url::Url;
use uuid::Uuid;

use crate::call::state::{CallAttemptState, CallState, RelocationTarget};
use crate::call::{
    AttemptRecord, AttemptStart, CallContext, CallEngine, CallError, CallErrorKind, CallOptions,
    CallResponse,
};
use crate::endpoints::{EndpointSelector, Relocation, SelectionError};
use crate::limiter::AdmissionController;
use crate::observability::metrics;
use crate::qos::{classify_response, classify_transport, FatalCause, QosOutcome};
use crate::resilience::timeouts::with_deadline;
use crate::resilience::Backoff;
use crate::transport::request::join;
use crate::transport::{PreparedRequest, Transport};

pub(crate) struct Orchestrator<'a, T: Transport> {
    engine: &'a CallEngine<T>,
    request: &'a PreparedRequest,
    context: &'a CallContext,
    limiter: Arc<AdmissionController>,
    call: CallAttemptState,
}

impl<'a, T: Transport> Orchestrator<'a, T> {
    pub(crate) fn new(
        engine: &'a CallEngine<T>,
        request: &'a PreparedRequest,
        options: &'a CallOptions,
    ) -> Self {
        let key = options.limiter_key.as_deref().unwrap_or(engine.service());
        let limiter = engine.limiters().acquire_limiter(key);
        let selector = EndpointSelector::new(engine.endpoints().clone(), engine.max_relocations);
        let backoff = Backoff::new(engine.backoff.clone());

        Self {
            engine,
            request,
            context: &options.context,
            limiter,
            call: CallAttemptState::new(request.path_and_query().to_string(), selector, backoff),
        }
    }

    pub(crate) fn call_id(&self) -> Uuid {
        self.call.call_id
    }

    pub(crate) async fn run(mut self) -> Result<CallResponse, CallError> {
        let mut state = CallState::Init;
        loop {
            tracing::trace!(state = state.name(), "Call state");
            state = match state {
                CallState::Init => CallState::Attempting,
                CallState::Attempting => self.attempt().await,
                CallState::Relocating { target, delay } => self.relocate(target, delay).await,
                CallState::BackingOff { delay } => {
                    tracing::debug!(delay = ?delay, retries = self.call.retries(), "Backing off");
                    tokio::time::sleep(delay).await;
                    CallState::Attempting
                }
                CallState::Succeeded(response) => return Ok(self.succeed(response)),
                CallState::Failed(kind) => return Err(self.fail(kind)),
            };
        }
    }

    async fn attempt(&mut self) -> CallState {
        self.call.attempts += 1;
        let attempt = self.call.attempts;
        let index = self.call.selector.current_index();
        let endpoint = self.call.selector.current().clone();

        let url = match Url::parse(&join(&endpoint, &self.call.path_and_query)) {
            Ok(url) => url,
            Err(e) => {
                return CallState::Failed(CallErrorKind::FatalResponse {
                    cause: FatalCause::InvalidRequest(e.to_string()),
                    response: None,
                })
            }
        };

        let permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(attempt, endpoint = %endpoint, error = %e, "Admission refused");
                self.record(attempt, &endpoint, "admission_refused", None, Duration::ZERO);
                return self.retry(None, CallErrorKind::CapacityExhausted(e));
            }
        };

        self.engine.observer.attempt_started(
            self.context,
            &AttemptStart {
                call_id: self.call.call_id,
                attempt,
                url: url.as_str(),
                endpoint: &endpoint,
            },
        );

        let started = Instant::now();
        let result = match self.request.to_http(&url) {
            Ok(request) => {
                with_deadline(self.engine.attempt_timeout, self.engine.transport.execute(request))
                    .await
            }
            Err(e) => Err(e),
        };
        let latency = started.elapsed();

        let status = result.as_ref().ok().map(|r| r.status().as_u16());
        let outcome = match result {
            Ok(response) => classify_response(response, &url),
            Err(error) => classify_transport(error),
        };

        if outcome.is_drop() {
            permit.dropped();
        } else if outcome.is_local() {
            permit.ignore();
        } else {
            permit.success_with_rtt(latency);
        }

        tracing::debug!(
            attempt,
            endpoint = %endpoint,
            outcome = outcome.label(),
            status = ?status,
            latency_ms = latency.as_millis() as u64,
            "Attempt completed"
        );
        let (engine, context) = (self.engine, self.context);
        let record = self.record(attempt, &endpoint, outcome.label(), status, latency);
        engine.observer.attempt_finished(context, record);

        match outcome {
            QosOutcome::Success(response) => {
                if self.call.selector.is_known(index) {
                    self.engine.endpoints().mark_preferred(index);
                }
                CallState::Succeeded(response)
            }
            QosOutcome::RetrySameEndpoint { after, cause } => {
                self.retry(after, CallErrorKind::TransportFailure(cause))
            }
            QosOutcome::Throttled { after } => self.retry(after, CallErrorKind::Throttled),
            QosOutcome::Unavailable { after } => CallState::Relocating {
                target: RelocationTarget::Next,
                delay: after,
            },
            QosOutcome::RetryOtherEndpoint { target } => CallState::Relocating {
                target: RelocationTarget::Redirect(target),
                delay: None,
            },
            QosOutcome::Fatal { cause, response } => {
                CallState::Failed(CallErrorKind::FatalResponse {
                    cause,
                    response: response.map(Box::new),
                })
            }
        }
    }

    /// Back off and retry the current endpoint, or fail with `exhausted`.
    fn retry(&mut self, after: Option<Duration>, exhausted: CallErrorKind) -> CallState {
        match self.call.backoff.next_delay() {
            Some(policy_delay) => CallState::BackingOff {
                delay: self.bounded(after).unwrap_or(policy_delay),
            },
            None => CallState::Failed(exhausted),
        }
    }

    /// Clamp a server-requested wait to the configured ceiling.
    fn bounded(&self, requested: Option<Duration>) -> Option<Duration> {
        requested.map(|delay| {
            if delay > self.engine.max_retry_after {
                tracing::debug!(
                    requested = ?delay,
                    ceiling = ?self.engine.max_retry_after,
                    "Capping Retry-After"
                );
            }
            delay.min(self.engine.max_retry_after)
        })
    }

    async fn relocate(&mut self, target: RelocationTarget, delay: Option<Duration>) -> CallState {
        let relocation = match &target {
            RelocationTarget::Next => Relocation::Next,
            RelocationTarget::Redirect(url) => Relocation::Redirect(url),
        };
        let from = self.call.selector.current().clone();

        match self.call.selector.relocate(relocation) {
            Ok(selection) => {
                if let Some(path_and_query) = selection.path_and_query {
                    self.call.path_and_query = path_and_query;
                }
                tracing::info!(
                    from = %from,
                    to = %selection.base,
                    relocations = self.call.relocations(),
                    "Relocating call"
                );
                if let Some(delay) = self.bounded(delay) {
                    tokio::time::sleep(delay).await;
                }
                CallState::Attempting
            }
            Err(SelectionError::RelocationLimitExceeded(max)) => {
                CallState::Failed(CallErrorKind::RelocationLimitExceeded(max))
            }
            Err(
                SelectionError::NoEndpointsRemaining
                | SelectionError::Empty
                | SelectionError::InvalidUrl(_),
            ) => CallState::Failed(CallErrorKind::EndpointsExhausted),
        }
    }

    /// Append to the history and metrics. Observers are told separately,
    /// only for attempts they saw start.
    fn record(
        &mut self,
        attempt: u32,
        endpoint: &Url,
        outcome: &'static str,
        status: Option<u16>,
        latency: Duration,
    ) -> &AttemptRecord {
        let record = AttemptRecord {
            attempt,
            endpoint: endpoint.to_string(),
            outcome,
            status,
            latency_ms: latency.as_millis() as u64,
        };
        metrics::record_attempt(&record.endpoint, outcome, latency);
        self.call.history.push(record);
        &self.call.history[self.call.history.len() - 1]
    }

    fn succeed(self, response: crate::transport::HttpResponse) -> CallResponse {
        metrics::record_call("success");
        tracing::debug!(
            attempts = self.call.attempts,
            relocations = self.call.relocations(),
            "Call succeeded"
        );
        CallResponse {
            call_id: self.call.call_id,
            response,
            attempts: self.call.attempts,
            relocations: self.call.relocations(),
            endpoint: self.call.selector.current().clone(),
            history: self.call.history,
        }
    }

    fn fail(self, kind: CallErrorKind) -> CallError {
        metrics::record_call(kind.label());
        tracing::warn!(
            attempts = self.call.attempts,
            retries = self.call.retries(),
            relocations = self.call.relocations(),
            error = %kind,
            "Call failed"
        );
        CallError {
            call_id: self.call.call_id,
            kind,
            attempts: self.call.attempts,
            last_endpoint: self.call.selector.current().clone(),
            history: self.call.history,
        }
    }
}
