//! Endpoint failover subsystem.
//!
//! # Data Flow
//! ```text
//! Call starts
//!     → set.rs (shared endpoint list, preferred starting index)
//!     → selector.rs (per-call traversal: visited marks, relocation count)
//!
//! Retryable outcome needing another endpoint:
//!     → selector.rs relocate(Next | Redirect(url))
//!     → Selection { base URL, request path } or SelectionError
//! ```
//!
//! # Design Decisions
//! - The endpoint set is shared and read-mostly; traversal state is private to a call
//! - Ring-order relocation never revisits an endpoint within one call
//! - Server-issued redirects may target any endpoint, or an unknown origin
//!   that is added for the rest of the call only
//! - Relocations are capped to break redirect loops

pub mod selector;
pub mod set;

pub use selector::{EndpointSelector, Relocation, Selection, SelectionError};
pub use set::EndpointSet;
