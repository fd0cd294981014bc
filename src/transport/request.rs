//! Endpoint-relative requests.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Request};
use url::Url;

use crate::transport::{HttpRequest, TransportError};

/// A request whose target is relative to whichever endpoint is selected.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: Method,
    path_and_query: String,
    headers: HeaderMap,
    body: Bytes,
}

impl PreparedRequest {
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(path_and_query: impl Into<String>) -> Self {
        Self::new(Method::GET, path_and_query)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Build the concrete request addressed at `url`.
    pub fn to_http(&self, url: &Url) -> Result<HttpRequest, TransportError> {
        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(url.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers.clone());
        }
        builder
            .body(self.body.clone())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

/// Append a path to a base URL, keeping any path prefix the base carries.
pub fn join(base: &Url, path_and_query: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    let tail = path_and_query.trim_start_matches('/');
    if tail.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, tail)
    }
}
