//! Admission permits.

use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::limiter::{AdmissionController, Completion};

/// A RAII guard holding one in-flight slot.
///
/// Report how the work finished with [`success`](Permit::success),
/// [`dropped`](Permit::dropped) or [`ignore`](Permit::ignore). A permit that is
/// simply dropped (e.g. the call was cancelled) is released as ignored.
#[derive(Debug)]
pub struct Permit {
    controller: Arc<AdmissionController>,
    started: Instant,
    released: bool,
}

impl Permit {
    pub(crate) fn new(controller: Arc<AdmissionController>) -> Self {
        Self {
            controller,
            started: Instant::now(),
            released: false,
        }
    }

    /// Time since the permit was granted.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Completed with a usable latency measured from acquisition.
    pub fn success(self) {
        let rtt = self.elapsed();
        self.release(Completion::Success(rtt));
    }

    /// Completed with an externally measured latency.
    pub fn success_with_rtt(self, rtt: Duration) {
        self.release(Completion::Success(rtt));
    }

    /// Rejected, throttled or timed out.
    pub fn dropped(self) {
        self.release(Completion::Dropped);
    }

    /// Released without teaching the limiter anything.
    pub fn ignore(self) {
        self.release(Completion::Ignored);
    }

    fn release(mut self, completion: Completion) {
        self.released = true;
        self.controller.release(completion);
    }
}

impl Deref for Permit {
    type Target = AdmissionController;
    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if !self.released {
            self.controller.release(Completion::Ignored);
        }
    }
}
