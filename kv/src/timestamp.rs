//! Timestamp representation shared by `VersionedStore` and
//! `TransactionCoordinator`.
//!
//! For TrueTime-style modes the high 32 bits encode seconds and the low 32
//! bits microseconds, matching the `uint64_t` packing the original C++
//! source uses (`(ts >> 32)` for seconds, `(ts & 0xffffffff)` for micros).
//! Comparison is lexicographic on the 64-bit composite, so plain integer
//! ordering already gives the right answer -- `Timestamp` is a transparent
//! newtype purely for type safety at call sites.

use serde_derive::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    /// Packs a `(seconds, micros)` pair the way the original source does.
    pub fn from_parts(seconds: u64, micros: u64) -> Self {
        Timestamp((seconds << 32) | (micros & 0xffff_ffff))
    }

    pub fn seconds(self) -> u64 {
        self.0 >> 32
    }

    pub fn micros(self) -> u64 {
        self.0 & 0xffff_ffff
    }

    /// `self - other` expressed in whole microseconds, saturating at zero
    /// when `other >= self`. Used by commit-wait to turn a timestamp delta
    /// into a sleep duration (spec §4.5 step 5).
    pub fn micros_since(self, other: Timestamp) -> u64 {
        if self <= other {
            return 0;
        }
        let secs_diff = self.seconds() as i64 - other.seconds() as i64;
        let micros_diff = self.micros() as i64 - other.micros() as i64;
        (secs_diff * 1_000_000 + micros_diff).max(0) as u64
    }

    pub fn max(self, other: Timestamp) -> Timestamp {
        std::cmp::max(self, other)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(v: u64) -> Self {
        Timestamp(v)
    }
}
