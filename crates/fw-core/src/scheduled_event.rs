//! Time-stamped event handed from a producer to the scheduler or output.

use core::cmp::Ordering;

/// An event due at `target_time` seconds on the output device clock.
///
/// Created by a producer with a future target time and consumed exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledEvent<P> {
    /// Target time in seconds on the output device clock.
    pub target_time: f64,
    pub payload: P,
}

impl<P> ScheduledEvent<P> {
    pub const fn new(target_time: f64, payload: P) -> Self {
        Self {
            target_time,
            payload,
        }
    }

    /// Total order on target time (NaN sorts last).
    pub fn cmp_time(&self, other: &Self) -> Ordering {
        self.target_time.total_cmp(&other.target_time)
    }

    /// Replace the payload, keeping the target time.
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> ScheduledEvent<Q> {
        ScheduledEvent {
            target_time: self.target_time,
            payload: f(self.payload),
        }
    }
}
