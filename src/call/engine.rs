//! Public entry point for resilient calls.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::call::orchestrator::Orchestrator;
use crate::call::{AttemptRecord, CallContext, CallError, CallObserver, NoopObserver};
use crate::config::loader::ConfigError;
use crate::config::validation::{validate_config, validate_plain_http};
use crate::config::EngineConfig;
use crate::endpoints::EndpointSet;
use crate::limiter::{AdmissionController, Limiters};
use crate::resilience::backoff::policy_from_config;
use crate::resilience::BackoffPolicy;
use crate::transport::{HttpResponse, HyperTransport, PreparedRequest, Transport};

/// Per-call knobs.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Limiter to admit through. Defaults to the service name.
    pub limiter_key: Option<String>,
    /// Opaque value handed to the observer with every attempt.
    pub context: CallContext,
}

impl CallOptions {
    pub fn with_limiter_key(mut self, key: impl Into<String>) -> Self {
        self.limiter_key = Some(key.into());
        self
    }

    pub fn with_context(mut self, context: CallContext) -> Self {
        self.context = context;
        self
    }
}

/// A logical call that reached the SUCCEEDED state.
#[derive(Debug)]
pub struct CallResponse {
    pub call_id: Uuid,
    pub response: HttpResponse,
    pub attempts: u32,
    pub relocations: u32,
    /// Base URL of the endpoint that answered.
    pub endpoint: Url,
    pub history: Vec<AttemptRecord>,
}

impl CallResponse {
    pub fn into_response(self) -> HttpResponse {
        self.response
    }
}

/// Executes logical calls against a replicated service.
///
/// Holds the state shared across calls: the endpoint set with its preferred
/// index, the limiter registry and the retry policy. Each call gets its own
/// selector and backoff cursor.
pub struct CallEngine<T: Transport> {
    pub(crate) transport: T,
    endpoints: EndpointSet,
    pub(crate) backoff: Arc<dyn BackoffPolicy>,
    limiters: Arc<Limiters>,
    pub(crate) observer: Arc<dyn CallObserver>,
    service: String,
    pub(crate) max_relocations: u32,
    pub(crate) attempt_timeout: Duration,
    /// Bound on server-requested waits.
    pub(crate) max_retry_after: Duration,
}

impl CallEngine<HyperTransport> {
    /// Build an engine backed by the hyper client. Plain HTTP endpoints only.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        validate_plain_http(config).map_err(ConfigError::Validation)?;
        let transport = HyperTransport::new(Duration::from_millis(config.timeouts.connect_ms));
        Self::new(config, transport)
    }
}

impl<T: Transport> CallEngine<T> {
    pub fn new(config: &EngineConfig, transport: T) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;
        let endpoints = EndpointSet::parse(&config.endpoints)?;

        tracing::info!(
            service = %config.service,
            endpoints = endpoints.len(),
            limiter = config.limiter.enabled,
            max_retries = config.retries.max_retries,
            "Call engine initialized"
        );

        Ok(Self {
            transport,
            endpoints,
            backoff: policy_from_config(&config.retries),
            limiters: Arc::new(Limiters::new(config.limiter.clone())),
            observer: Arc::new(NoopObserver),
            service: config.service.clone(),
            max_relocations: config.relocation.max_relocations,
            attempt_timeout: Duration::from_millis(config.timeouts.attempt_ms),
            max_retry_after: Duration::from_millis(config.retries.max_retry_after_ms),
        })
    }

    /// Replace the retry policy derived from config.
    pub fn with_backoff(mut self, policy: Arc<dyn BackoffPolicy>) -> Self {
        self.backoff = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Share a limiter registry with other engines.
    pub fn with_limiters(mut self, limiters: Arc<Limiters>) -> Self {
        self.limiters = limiters;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    pub fn limiters(&self) -> &Arc<Limiters> {
        &self.limiters
    }

    /// The limiter a call with `key` would admit through.
    pub fn limiter(&self, key: &str) -> Arc<AdmissionController> {
        self.limiters.acquire_limiter(key)
    }

    /// Run one logical call with default options.
    pub async fn execute(&self, request: PreparedRequest) -> Result<CallResponse, CallError> {
        self.execute_with(request, CallOptions::default()).await
    }

    /// Run one logical call.
    ///
    /// Resolves once the call reaches a terminal state. Dropping the returned
    /// future cancels the call: any held permit is released without a sample
    /// and pending timers are discarded.
    pub async fn execute_with(
        &self,
        request: PreparedRequest,
        options: CallOptions,
    ) -> Result<CallResponse, CallError> {
        let orchestrator = Orchestrator::new(self, &request, &options);
        let span = tracing::info_span!(
            "call",
            call_id = %orchestrator.call_id(),
            service = %self.service,
            method = %request.method(),
            path = %request.path_and_query(),
        );
        orchestrator.run().instrument(span).await
    }
}
