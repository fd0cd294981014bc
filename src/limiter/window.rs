//! Immutable sample window.
//!
//! Every observation produces a new window; the controller publishes it
//! through a single atomic pointer swap.

use std::fmt;
use std::time::Duration;

/// Statistics gathered over one sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    min_rtt_nanos: u64,
    sum_rtt_nanos: u64,
    sample_count: usize,
    drop_count: usize,
    max_in_flight: usize,
    did_drop: bool,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self {
            min_rtt_nanos: u64::MAX,
            sum_rtt_nanos: 0,
            sample_count: 0,
            drop_count: 0,
            max_in_flight: 0,
            did_drop: false,
        }
    }
}

impl SampleWindow {
    /// Window with one more completed sample.
    pub fn add_sample(&self, rtt: Duration, in_flight: usize) -> Self {
        let rtt = u64::try_from(rtt.as_nanos()).unwrap_or(u64::MAX).max(1);
        Self {
            min_rtt_nanos: self.min_rtt_nanos.min(rtt),
            sum_rtt_nanos: self.sum_rtt_nanos.saturating_add(rtt),
            sample_count: self.sample_count + 1,
            max_in_flight: self.max_in_flight.max(in_flight),
            ..*self
        }
    }

    /// Window with one more dropped sample. Drops carry no latency.
    pub fn add_dropped(&self, in_flight: usize) -> Self {
        Self {
            drop_count: self.drop_count + 1,
            max_in_flight: self.max_in_flight.max(in_flight),
            did_drop: true,
            ..*self
        }
    }

    pub fn min_rtt(&self) -> Option<Duration> {
        (self.sample_count > 0).then(|| Duration::from_nanos(self.min_rtt_nanos))
    }

    pub fn average_rtt(&self) -> Option<Duration> {
        (self.sample_count > 0)
            .then(|| Duration::from_nanos(self.sum_rtt_nanos / self.sample_count as u64))
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn drop_count(&self) -> usize {
        self.drop_count
    }

    /// Samples and drops together.
    pub fn event_count(&self) -> usize {
        self.sample_count + self.drop_count
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn did_drop(&self) -> bool {
        self.did_drop
    }

    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }
}

impl fmt::Display for SampleWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SampleWindow [minRtt={:?}, avgRtt={:?}, maxInFlight={}, samples={}, drops={}]",
            self.min_rtt().unwrap_or_default(),
            self.average_rtt().unwrap_or_default(),
            self.max_in_flight,
            self.sample_count,
            self.drop_count
        )
    }
}
