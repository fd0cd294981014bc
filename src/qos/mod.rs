//! Quality-of-service signal interpretation.
//!
//! # Data Flow
//! ```text
//! Attempt result
//!     → Response: outcome.rs classify_response (status + headers.rs)
//!     → Transport error: outcome.rs classify_transport
//!     → QosOutcome (matched exhaustively by the orchestrator)
//! ```
//!
//! # Design Decisions
//! - Closed set of outcomes, one per attempt
//! - 2xx success; 429 throttled; 503 unavailable; 3xx with Location redirects
//! - Everything else is fatal and surfaced unchanged

pub mod headers;
pub mod outcome;

pub use outcome::{classify_response, classify_transport, FatalCause, QosOutcome};
