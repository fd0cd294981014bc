//! Transport seam.
//!
//! # Responsibilities
//! - Define the single capability the engine needs: execute a prepared
//!   request against a concrete URL and return a buffered response
//! - Provide a hyper-based implementation for plain HTTP
//!
//! # Design Decisions
//! - The engine never builds bodies or headers; it only substitutes the endpoint
//! - Responses are fully buffered so they can be classified and retried freely
//! - Transport failures are distinct from server responses

pub mod client;
pub mod request;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

pub use client::HyperTransport;
pub use request::PreparedRequest;

/// A request addressed at one concrete endpoint.
pub type HttpRequest = http::Request<Bytes>;

/// A fully buffered response.
pub type HttpResponse = http::Response<Bytes>;

/// Connection or IO level failure. No response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Executes a single HTTP exchange.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).execute(request)
    }
}
