//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → consumed by CallEngine::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AdmissionMode;
pub use schema::EngineConfig;
pub use schema::LimiterConfig;
pub use schema::ObservabilityConfig;
pub use schema::RelocationConfig;
pub use schema::RetryConfig;
pub use schema::TimeoutConfig;
