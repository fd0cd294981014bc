//! Adaptive concurrency limiting (admission control).
//!
//! # Data Flow
//! ```text
//! Call wants to attempt
//!     → registry.rs (controller for the limiter key)
//!     → controller.rs acquire() → permit.rs Permit
//!
//! Attempt finished
//!     → Permit::success / dropped / ignore
//!     → window.rs (new immutable SampleWindow swapped in)
//!     → on rollover: vegas.rs computes the next limit
//! ```
//!
//! # Design Decisions
//! - One controller per logical target, shared across calls
//! - No locks on the acquire/release path
//! - The limit only changes at window rollover

pub mod controller;
pub mod permit;
pub mod registry;
pub mod vegas;
pub mod window;

pub use controller::{AdmissionController, AdmissionError, Completion};
pub use permit::Permit;
pub use registry::Limiters;
pub use vegas::VegasLimit;
pub use window::SampleWindow;
