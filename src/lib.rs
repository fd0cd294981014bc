//! Resilient call engine.
//!
//! Executes logical HTTP calls against a replicated service: retries with
//! backoff, fails over between endpoints, follows redirects and honors
//! throttling signals, all behind an adaptive concurrency limiter.

// Core subsystems
pub mod call;
pub mod config;
pub mod endpoints;
pub mod transport;

// Traffic management
pub mod limiter;
pub mod qos;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use call::{CallEngine, CallError, CallErrorKind, CallOptions, CallResponse};
pub use config::EngineConfig;
pub use transport::{HyperTransport, PreparedRequest, Transport};
