//! `TimestampOracle`: the coordinator-external monotonic timestamp
//! allocator used only in `OCC` mode (spec §4.4). In the original source
//! this is a replicated VR service reached through the shared transport; in
//! this crate that replicated service is represented by the
//! `TimestampTransport` trait (see `transport.rs`), and `AtomicTimestampOracle`
//! is the single-process stand-in `LocalTransport` wires up for tests and
//! the CLI demo.

use crate::timestamp::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic allocator: each call to `allocate` returns a value strictly
/// greater than every value returned so far, across every caller sharing
/// this instance.
pub struct AtomicTimestampOracle {
    next: AtomicU64,
}

impl AtomicTimestampOracle {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn allocate(&self) -> Timestamp {
        Timestamp(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for AtomicTimestampOracle {
    fn default() -> Self {
        Self::new()
    }
}
