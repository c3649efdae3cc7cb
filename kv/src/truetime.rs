//! `TrueTimeOracle`: the bounded-uncertainty wall clock commit-wait is built
//! on (spec §4.3). Contract: `now_with_error()` returns `(now, err)` such
//! that real time lies in `[now - err, now + err]` at the moment of the
//! call. Assumed monotonic on a single node; not assumed synchronized across
//! coordinators except through the uncertainty bound.

use crate::timestamp::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

pub trait TrueTimeOracle: Send + Sync {
    /// Returns `(now, err)`, both in the same `Timestamp` packing used
    /// elsewhere in the crate, with `err` a non-negative microsecond bound.
    fn now_with_error(&self) -> (Timestamp, Timestamp);
}

/// Production oracle: wall clock plus a fixed, configured uncertainty
/// bound. A real TrueTime deployment derives `err` from local clock drift
/// and synchronization signal quality; this crate has no such signal
/// available, so the bound is a static configuration parameter
/// (`truetime_uncertainty_micros` in `ClusterConfig`).
pub struct SystemTrueTime {
    uncertainty_micros: u64,
}

impl SystemTrueTime {
    pub fn new(uncertainty_micros: u64) -> Self {
        Self { uncertainty_micros }
    }
}

impl TrueTimeOracle for SystemTrueTime {
    fn now_with_error(&self) -> (Timestamp, Timestamp) {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before unix epoch");
        let now_ts = Timestamp::from_parts(now.as_secs(), now.subsec_micros() as u64);
        (now_ts, Timestamp::from_parts(0, self.uncertainty_micros))
    }
}

/// Test double that returns a fixed `(now, err)` pair, letting tests drive
/// commit-wait deterministically (spec §8 scenario S5).
pub struct FixedTrueTime {
    pub now: Timestamp,
    pub err: Timestamp,
}

impl TrueTimeOracle for FixedTrueTime {
    fn now_with_error(&self) -> (Timestamp, Timestamp) {
        (self.now, self.err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_true_time_reports_the_configured_uncertainty() {
        let tt = SystemTrueTime::new(5_000);
        let (_now, err) = tt.now_with_error();
        assert_eq!(err.micros(), 5_000);
    }
}
