//! Logical call orchestration.
//!
//! # Data Flow
//! ```text
//! CallEngine::execute(request)
//!     → Orchestrator (one per call)
//!         → AdmissionController::acquire (permit)
//!         → Transport::execute (attempt, under deadline)
//!         → qos::classify_* (QosOutcome)
//!         → Permit report (sample / drop / ignore)
//!         → CallState transition (retry, relocate, finish)
//!     → CallResponse | CallError
//! ```

mod engine;
pub mod error;
pub mod observer;
mod orchestrator;
pub mod state;

pub use engine::{CallEngine, CallOptions, CallResponse};
pub use error::{AttemptRecord, CallError, CallErrorKind};
pub use observer::{AttemptStart, CallContext, CallObserver, NoopObserver, TracingObserver};
pub use state::{CallState, RelocationTarget};
