//! QoS-relevant response headers.

use std::time::{Duration, SystemTime};

use http::header::{HeaderMap, LOCATION, RETRY_AFTER};
use url::Url;

/// `Retry-After` as a delay from now.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    retry_after_at(headers, SystemTime::now())
}

/// `Retry-After` as a delay from `now`. Accepts (possibly fractional)
/// seconds or an HTTP-date; a date in the past means no wait.
pub fn retry_after_at(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<f64>() {
        return seconds_to_duration(seconds);
    }

    let date = httpdate::parse_http_date(value).ok()?;
    match date.duration_since(now) {
        Ok(duration) => Some(duration),
        Err(_) => Some(Duration::ZERO),
    }
}

fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let nanos = (seconds * 1e9).round();
    if nanos >= u64::MAX as f64 {
        Some(Duration::MAX)
    } else {
        Some(Duration::from_nanos(nanos as u64))
    }
}

/// `Location` resolved against the URL that produced the response.
///
/// `Err` carries the raw header when it is present but unusable.
pub fn location(headers: &HeaderMap, requested: &Url) -> Option<Result<Url, String>> {
    let raw = headers.get(LOCATION)?;
    let resolved = raw
        .to_str()
        .ok()
        .and_then(|value| requested.join(value).ok())
        .ok_or_else(|| String::from_utf8_lossy(raw.as_bytes()).into_owned());
    Some(resolved)
}
