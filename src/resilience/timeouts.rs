//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each transport attempt with a deadline
//! - Cancel the attempt cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other transport errors

use std::future::Future;
use std::time::Duration;

use crate::transport::TransportError;

/// Run `attempt`, failing with [`TransportError::Timeout`] once `deadline` passes.
///
/// The inner future is dropped on timeout, aborting the in-flight exchange.
pub async fn with_deadline<F, T>(deadline: Duration, attempt: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(deadline, attempt).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(deadline)),
    }
}
