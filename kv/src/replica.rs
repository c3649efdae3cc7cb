//! `ShardReplica`: the minimal per-shard handler needed to drive
//! `VersionedStore` from `Prepare`/`Commit`/`Abort` messages and compute a
//! `proposed_ts`.
//!
//! spec §9 explicitly leaves the proposed-timestamp rule to the (out of
//! scope) replica layer: "the source passes an empty `Timestamp()` into
//! `Prepare` and relies on shards to return a proposed timestamp... this
//! specification only constrains the coordinator's reduction." This module
//! is this crate's one reference rule, used by `LocalTransport` for tests
//! and the CLI demo -- it is not a generalized concurrency-control engine,
//! and a production replica (running real Paxos/VR consensus) would likely
//! implement something considerably more careful. The rule used here:
//!
//! - A transaction may safely commit a write to `key` at `ts` only if no
//!   later reader has already observed an earlier version of `key`, i.e.
//!   `ts` must exceed `key`'s current last-read watermark.
//! - `ts` must also exceed `key`'s current latest `write_ts`, since
//!   versions within a key must be unique and increasing.
//!
//! The reply's `proposed_ts` is the smallest timestamp satisfying both
//! constraints for every key the transaction reads or writes; this
//! reference replica never returns `Fail` or `Retry` since it performs no
//! further validation (DESIGN.md records this as a deliberate
//! simplification, not an omission of the spec's reduction rule, which
//! lives entirely in `coordinator.rs`).

use crate::store::VersionedStore;
use crate::timestamp::Timestamp;
use crate::transport::{PrepareReply, ReplyStatus};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct PendingTxn {
    /// Keys read, and the `write_ts` of the version that was served.
    reads: Vec<(Vec<u8>, Timestamp)>,
    /// The write set shipped with `Prepare`, retained so `Commit` (which
    /// per spec §4.5 carries only the final timestamp) can apply it.
    writes: Vec<(Vec<u8>, Vec<u8>)>,
}

pub struct ShardReplica {
    store: Mutex<VersionedStore>,
    pending: Mutex<HashMap<u64, PendingTxn>>,
}

impl ShardReplica {
    pub fn new() -> Self {
        Self { store: Mutex::new(VersionedStore::new()), pending: Mutex::new(HashMap::new()) }
    }

    pub fn begin(&self, t_id: u64) {
        self.pending.lock().unwrap().insert(t_id, PendingTxn::default());
    }

    pub fn get(&self, t_id: u64, key: &[u8]) -> Option<Vec<u8>> {
        let store = self.store.lock().unwrap();
        let (ts, value) = store.get(key)?;
        drop(store);
        self.pending.lock().unwrap().entry(t_id).or_default().reads.push((key.to_vec(), ts));
        Some(value)
    }

    pub fn prepare(&self, t_id: u64, proposed_ts: Timestamp, writes: &[(Vec<u8>, Vec<u8>)]) -> PrepareReply {
        let store = self.store.lock().unwrap();
        let mut ts = proposed_ts;

        let reads = self.pending.lock().unwrap().get(&t_id).map(|p| p.reads.clone()).unwrap_or_default();
        let touched_keys: Vec<&[u8]> =
            reads.iter().map(|(k, _)| k.as_slice()).chain(writes.iter().map(|(k, _)| k.as_slice())).collect();

        for key in touched_keys {
            if let Some(watermark) = store.get_last_read(key) {
                if watermark >= ts {
                    ts = Timestamp(watermark.0 + 1);
                }
            }
            if let Some((latest, _)) = store.get(key) {
                if latest >= ts {
                    ts = Timestamp(latest.0 + 1);
                }
            }
        }
        drop(store);

        if let Some(pending) = self.pending.lock().unwrap().get_mut(&t_id) {
            pending.writes = writes.to_vec();
        }

        PrepareReply { status: ReplyStatus::Ok, proposed_ts: ts }
    }

    pub fn commit(&self, t_id: u64, commit_ts: Timestamp) {
        let Some(pending) = self.pending.lock().unwrap().remove(&t_id) else { return };
        let mut store = self.store.lock().unwrap();
        for (key, value) in &pending.writes {
            store.put(key, value.clone(), commit_ts);
        }
        for (key, read_ts) in pending.reads {
            store.commit_get(&key, read_ts, commit_ts);
        }
    }

    pub fn abort(&self, t_id: u64) {
        self.pending.lock().unwrap().remove(&t_id);
    }

    /// Diagnostic snapshot used by the CLI `status` command and tests.
    pub fn get_latest(&self, key: &[u8]) -> Option<(Timestamp, Vec<u8>)> {
        self.store.lock().unwrap().get(key)
    }
}

impl Default for ShardReplica {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_proposes_past_the_last_read_watermark() {
        let replica = ShardReplica::new();
        replica.begin(99);
        replica.prepare(99, Timestamp(10), &[(b"x".to_vec(), b"a".to_vec())]);
        replica.commit(99, Timestamp(10));
        // A reader committing at ts=50 observed "x"'s version at ts=10,
        // raising its last-read watermark.
        {
            let mut store = replica.store.lock().unwrap();
            store.commit_get(b"x", Timestamp(10), Timestamp(50));
        }
        let reply = replica.prepare(1, Timestamp(0), &[(b"x".to_vec(), b"b".to_vec())]);
        assert!(reply.proposed_ts > Timestamp(50));
    }

    #[test]
    fn commit_applies_writes_and_records_reads() {
        let replica = ShardReplica::new();
        replica.begin(1);
        replica.prepare(1, Timestamp(0), &[(b"x".to_vec(), b"1".to_vec())]);
        replica.commit(1, Timestamp(5));
        assert_eq!(replica.get_latest(b"x"), Some((Timestamp(5), b"1".to_vec())));
    }

    #[test]
    fn abort_drops_pending_state_without_touching_the_store() {
        let replica = ShardReplica::new();
        replica.begin(1);
        replica.get(1, b"x");
        replica.abort(1);
        assert_eq!(replica.get_latest(b"x"), None);
    }
}
