//! Classification of attempt results.

use std::fmt;
use std::time::Duration;

use http::StatusCode;
use url::Url;

use crate::qos::headers;
use crate::transport::{HttpResponse, TransportError};

/// Why an attempt cannot be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalCause {
    /// Status outside the QoS set.
    Status(StatusCode),
    /// Redirect whose `Location` could not be used.
    InvalidRedirect(String),
    /// The request could not be built or sent as given.
    InvalidRequest(String),
}

impl fmt::Display for FatalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalCause::Status(status) => write!(f, "status {}", status),
            FatalCause::InvalidRedirect(location) => write!(f, "unusable redirect '{}'", location),
            FatalCause::InvalidRequest(reason) => write!(f, "invalid request: {}", reason),
        }
    }
}

/// Exactly one per completed attempt. Owns whatever the attempt produced.
#[derive(Debug)]
pub enum QosOutcome {
    Success(HttpResponse),
    /// Transport-level failure; retry the same endpoint after a delay.
    RetrySameEndpoint {
        after: Option<Duration>,
        cause: TransportError,
    },
    /// Server-issued redirect.
    RetryOtherEndpoint { target: Url },
    /// 429, or admission refused locally.
    Throttled { after: Option<Duration> },
    /// 503; move away from this endpoint.
    Unavailable { after: Option<Duration> },
    Fatal {
        cause: FatalCause,
        response: Option<HttpResponse>,
    },
}

impl QosOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            QosOutcome::Success(_) => "success",
            QosOutcome::RetrySameEndpoint { .. } => "transport_failure",
            QosOutcome::RetryOtherEndpoint { .. } => "redirect",
            QosOutcome::Throttled { .. } => "throttled",
            QosOutcome::Unavailable { .. } => "unavailable",
            QosOutcome::Fatal { .. } => "fatal",
        }
    }

    /// Whether the limiter should count this attempt as a drop rather than a latency sample.
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            QosOutcome::RetrySameEndpoint { .. }
                | QosOutcome::Throttled { .. }
                | QosOutcome::Unavailable { .. }
        )
    }

    /// True when nothing reached the server.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            QosOutcome::Fatal {
                cause: FatalCause::InvalidRequest(_),
                ..
            }
        )
    }
}

/// Classify a received response. `requested` is the URL the attempt was sent to.
pub fn classify_response(response: HttpResponse, requested: &Url) -> QosOutcome {
    let status = response.status();
    let headers = response.headers();

    if status.is_success() {
        return QosOutcome::Success(response);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => QosOutcome::Throttled {
            after: headers::retry_after(headers),
        },
        StatusCode::SERVICE_UNAVAILABLE => QosOutcome::Unavailable {
            after: headers::retry_after(headers),
        },
        StatusCode::MOVED_PERMANENTLY
        | StatusCode::FOUND
        | StatusCode::SEE_OTHER
        | StatusCode::TEMPORARY_REDIRECT
        | StatusCode::PERMANENT_REDIRECT => match headers::location(headers, requested) {
            Some(Ok(target)) => QosOutcome::RetryOtherEndpoint { target },
            Some(Err(raw)) => QosOutcome::Fatal {
                cause: FatalCause::InvalidRedirect(raw),
                response: Some(response),
            },
            None => QosOutcome::Fatal {
                cause: FatalCause::Status(status),
                response: Some(response),
            },
        },
        _ => QosOutcome::Fatal {
            cause: FatalCause::Status(status),
            response: Some(response),
        },
    }
}

/// Classify a transport failure.
pub fn classify_transport(error: TransportError) -> QosOutcome {
    match error {
        TransportError::InvalidRequest(reason) => QosOutcome::Fatal {
            cause: FatalCause::InvalidRequest(reason),
            response: None,
        },
        cause => QosOutcome::RetrySameEndpoint { after: None, cause },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::header::{HeaderName, LOCATION, RETRY_AFTER};
    use http::Response;

    fn response(status: u16, headers: &[(HeaderName, &'static str)]) -> HttpResponse {
        let mut builder = Response::builder().status(status);
        for (name, value) in headers {
            builder = builder.header(name.clone(), *value);
        }
        builder.body(Bytes::new()).unwrap()
    }

    fn classify(status: u16, headers: &[(HeaderName, &'static str)]) -> QosOutcome {
        let requested = Url::parse("http://node-0:8080/v1/items").unwrap();
        classify_response(response(status, headers), &requested)
    }

    #[test]
    fn test_success_statuses() {
        for status in [200, 201, 204] {
            let outcome = classify(status, &[]);
            assert!(matches!(&outcome, QosOutcome::Success(r) if r.status().as_u16() == status));
            assert!(!outcome.is_drop());
        }
    }

    #[test]
    fn test_throttled_with_and_without_header() {
        assert!(matches!(
            classify(429, &[(RETRY_AFTER, "2")]),
            QosOutcome::Throttled { after: Some(d) } if d == Duration::from_secs(2)
        ));
        assert!(matches!(classify(429, &[]), QosOutcome::Throttled { after: None }));
    }

    #[test]
    fn test_unavailable() {
        let outcome = classify(503, &[]);
        assert!(matches!(outcome, QosOutcome::Unavailable { after: None }));
        assert!(outcome.is_drop());
    }

    #[test]
    fn test_redirects() {
        let outcome = classify(308, &[(LOCATION, "http://node-2:8080/v1/items")]);
        assert!(matches!(
            &outcome,
            QosOutcome::RetryOtherEndpoint { target } if target.as_str() == "http://node-2:8080/v1/items"
        ));
        assert!(!outcome.is_drop());

        assert!(matches!(
            classify(307, &[]),
            QosOutcome::Fatal { cause: FatalCause::Status(StatusCode::TEMPORARY_REDIRECT), response: Some(_) }
        ));
        assert!(matches!(
            classify(304, &[]),
            QosOutcome::Fatal { cause: FatalCause::Status(StatusCode::NOT_MODIFIED), .. }
        ));
    }

    #[test]
    fn test_other_errors_are_fatal_and_keep_response() {
        for status in [400, 401, 404, 500, 502] {
            match classify(status, &[]) {
                QosOutcome::Fatal { cause: FatalCause::Status(s), response: Some(r) } => {
                    assert_eq!(s.as_u16(), status);
                    assert_eq!(r.status().as_u16(), status);
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }
    }

    #[test]
    fn test_transport_classification() {
        let outcome = classify_transport(TransportError::Connect("refused".into()));
        assert!(matches!(
            &outcome,
            QosOutcome::RetrySameEndpoint { after: None, cause: TransportError::Connect(_) }
        ));
        assert!(outcome.is_drop());

        assert!(matches!(
            classify_transport(TransportError::Timeout(Duration::from_secs(1))),
            QosOutcome::RetrySameEndpoint { .. }
        ));

        let local = classify_transport(TransportError::InvalidRequest("bad uri".into()));
        assert!(local.is_local());
        assert!(matches!(local, QosOutcome::Fatal { cause: FatalCause::InvalidRequest(_), response: None }));
    }
}
