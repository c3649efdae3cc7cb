//! `VersionedStore`: the per-shard, in-memory, multi-version store each
//! shard replica uses as its local storage layer.
//!
//! Grounded directly on `store/backend/versionedKVStore.cc` (the TAPIR /
//! SpanStore timestamped version store this crate is modelled on), not on a
//! snapshot-isolation-over-a-log-engine design: there is no active-
//! transaction visibility set here, just an ordered set of `(write_ts,
//! value)` records per key plus a last-read high-water mark per version.
//!
//! Versions are never removed (`put` only ever inserts); garbage collection
//! is explicitly out of scope (spec Non-goals).

use crate::timestamp::Timestamp;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;

/// An immutable `(write_ts, value)` record under a key. Ordered, and
/// considered equal to other values, solely by `write_ts` -- this lets
/// `BTreeSet::insert` implement the "overwrite on exact-timestamp
/// collision" rule from spec §4.1 for free: inserting a value whose
/// `write_ts` already exists replaces the old entry.
#[derive(Clone, Debug)]
pub struct VersionedValue {
    pub write_ts: Timestamp,
    pub value: Vec<u8>,
}

impl PartialEq for VersionedValue {
    fn eq(&self, other: &Self) -> bool {
        self.write_ts == other.write_ts
    }
}
impl Eq for VersionedValue {}

impl PartialOrd for VersionedValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for VersionedValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.write_ts.cmp(&other.write_ts)
    }
}

/// Per-shard multi-version store. Not internally thread-safe by design --
/// spec §5 assigns it single-owner-per-replica and leaves serialization to
/// the replica.
#[derive(Default)]
pub struct VersionedStore {
    store: HashMap<Vec<u8>, BTreeSet<VersionedValue>>,
    last_reads: HashMap<(Vec<u8>, Timestamp), Timestamp>,
}

impl VersionedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_store(&self, key: &[u8]) -> bool {
        self.store.get(key).is_some_and(|versions| !versions.is_empty())
    }

    /// Returns the most recent value and timestamp for `key`.
    pub fn get(&self, key: &[u8]) -> Option<(Timestamp, Vec<u8>)> {
        self.store.get(key)?.iter().next_back().map(|v| (v.write_ts, v.value.clone()))
    }

    /// The `write_ts` of the version valid at `t`, i.e. the greatest
    /// `write_ts <= t`. The C++ source finds this via `upper_bound(t)`
    /// followed by one step back; a `BTreeSet` range query to `t` inclusive
    /// and taking the last element is the same lookup expressed with
    /// Rust's range API.
    fn version_at(&self, key: &[u8], t: Timestamp) -> Option<Timestamp> {
        self.store.get(key)?.range((Bound::Unbounded, Bound::Included(VersionedValue {
            write_ts: t,
            value: Vec::new(),
        }))).next_back().map(|v| v.write_ts)
    }

    /// Returns the value valid at `t`. `None` if `key` is absent or every
    /// version postdates `t`.
    pub fn get_at(&self, key: &[u8], t: Timestamp) -> Option<(Timestamp, Vec<u8>)> {
        let ts = self.version_at(key, t)?;
        let versions = self.store.get(key)?;
        versions.get(&VersionedValue { write_ts: ts, value: Vec::new() }).map(|v| (v.write_ts, v.value.clone()))
    }

    /// The half-open interval `[lo, hi)` during which the version valid at
    /// `t` is authoritative. `hi` is `None` if no newer version exists yet.
    pub fn get_range(&self, key: &[u8], t: Timestamp) -> Option<(Timestamp, Option<Timestamp>)> {
        let lo = self.version_at(key, t)?;
        let versions = self.store.get(key)?;
        let hi = versions
            .range((Bound::Excluded(VersionedValue { write_ts: lo, value: Vec::new() }), Bound::Unbounded))
            .next()
            .map(|v| v.write_ts);
        Some((lo, hi))
    }

    /// Inserts `(t, value)` as a new version of `key`. A version already
    /// present at exactly `t` is overwritten.
    pub fn put(&mut self, key: &[u8], value: Vec<u8>, t: Timestamp) {
        self.store.entry(key.to_vec()).or_default().replace(VersionedValue { write_ts: t, value });
    }

    /// Records that a transaction committing at `commit_ts` read the
    /// version of `key` valid at `read_ts`, raising that version's
    /// last-read watermark if `commit_ts` exceeds it. A no-op if the shard
    /// has no version valid at `read_ts` (the shard may be behind).
    pub fn commit_get(&mut self, key: &[u8], read_ts: Timestamp, commit_ts: Timestamp) {
        let Some(version_ts) = self.version_at(key, read_ts) else { return };
        let watermark = self.last_reads.entry((key.to_vec(), version_ts)).or_insert(Timestamp::ZERO);
        if *watermark < commit_ts {
            *watermark = commit_ts;
        }
    }

    /// Last-read high-water mark of `key`'s latest version.
    pub fn get_last_read(&self, key: &[u8]) -> Option<Timestamp> {
        let (latest_ts, _) = self.get(key)?;
        self.last_reads.get(&(key.to_vec(), latest_ts)).copied()
    }

    /// Last-read high-water mark of the version valid at `t`.
    ///
    /// Precondition: the caller must have previously read at `t` (i.e. a
    /// version valid at `t` must exist). Violating this is a programming
    /// error, not a recoverable failure -- spec §7 requires it be detected
    /// loudly, so this panics rather than returning `Option`.
    pub fn get_last_read_at(&self, key: &[u8], t: Timestamp) -> Option<Timestamp> {
        let version_ts = self
            .version_at(key, t)
            .unwrap_or_else(|| panic!("get_last_read_at: no version of key valid at {t}"));
        self.last_reads.get(&(key.to_vec(), version_ts)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_read_your_writes_within_a_key() {
        let mut s = VersionedStore::new();
        s.put(b"x", b"1".to_vec(), Timestamp(1));
        s.put(b"x", b"2".to_vec(), Timestamp(2));
        assert_eq!(s.get(b"x"), Some((Timestamp(2), b"2".to_vec())));
    }

    #[test]
    fn s2_snapshot_read() {
        let mut s = VersionedStore::new();
        s.put(b"x", b"a".to_vec(), Timestamp(10));
        s.put(b"x", b"b".to_vec(), Timestamp(20));
        s.put(b"x", b"c".to_vec(), Timestamp(30));

        assert_eq!(s.get_at(b"x", Timestamp(25)), Some((Timestamp(20), b"b".to_vec())));
        assert_eq!(s.get_at(b"x", Timestamp(10)), Some((Timestamp(10), b"a".to_vec())));
        assert_eq!(s.get_at(b"x", Timestamp(5)), None);

        assert_eq!(s.get_range(b"x", Timestamp(25)), Some((Timestamp(20), Some(Timestamp(30)))));
        assert_eq!(s.get_range(b"x", Timestamp(30)), Some((Timestamp(30), None)));
    }

    #[test]
    fn s6_last_read_watermark_rises_but_never_falls() {
        let mut s = VersionedStore::new();
        s.put(b"x", b"a".to_vec(), Timestamp(10));
        s.commit_get(b"x", Timestamp(15), Timestamp(30));
        s.commit_get(b"x", Timestamp(15), Timestamp(20));
        assert_eq!(s.get_last_read_at(b"x", Timestamp(15)), Some(Timestamp(30)));
    }

    #[test]
    fn commit_get_on_a_shard_behind_is_a_no_op() {
        let mut s = VersionedStore::new();
        // No version of "x" exists at all yet.
        s.commit_get(b"x", Timestamp(15), Timestamp(30));
        assert!(!s.in_store(b"x"));
    }

    #[test]
    fn version_ordering_is_independent_of_insertion_order() {
        let mut s = VersionedStore::new();
        s.put(b"k", b"three".to_vec(), Timestamp(3));
        s.put(b"k", b"one".to_vec(), Timestamp(1));
        s.put(b"k", b"two".to_vec(), Timestamp(2));
        let versions: Vec<Timestamp> = s.store.get(b"k".as_slice()).unwrap().iter().map(|v| v.write_ts).collect();
        assert_eq!(versions, vec![Timestamp(1), Timestamp(2), Timestamp(3)]);
    }

    #[test]
    fn put_at_an_existing_timestamp_overwrites() {
        let mut s = VersionedStore::new();
        s.put(b"k", b"first".to_vec(), Timestamp(5));
        s.put(b"k", b"second".to_vec(), Timestamp(5));
        assert_eq!(s.get(b"k"), Some((Timestamp(5), b"second".to_vec())));
    }

    #[test]
    #[should_panic(expected = "no version of key valid at")]
    fn get_last_read_at_on_a_missing_version_panics() {
        let s = VersionedStore::new();
        s.get_last_read_at(b"ghost", Timestamp(1));
    }
}
