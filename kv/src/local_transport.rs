//! `LocalTransport`: the in-process stand-in for the network transport the
//! spec treats as an external collaborator (spec §1, §9). Used by tests and
//! the CLI demo so the coordinator, 2PC algorithm, and commit-wait math are
//! exercisable without a real RPC layer. A production deployment replaces
//! this with a transport over the replica group's actual consensus
//! protocol.

use crate::error::{Error, Result};
use crate::replica::ShardReplica;
use crate::timestamp::Timestamp;
use crate::timestamp_oracle::AtomicTimestampOracle;
use crate::transport::{PrepareReply, ShardTransport, TimestampTransport};
use async_trait::async_trait;
use std::sync::Arc;

/// Binds one `BufferClient`'s traffic directly to one in-memory
/// `ShardReplica`, with no serialization and no simulated latency.
pub struct LocalShardTransport {
    replica: Arc<ShardReplica>,
}

impl LocalShardTransport {
    pub fn new(replica: Arc<ShardReplica>) -> Self {
        Self { replica }
    }
}

#[async_trait]
impl ShardTransport for LocalShardTransport {
    async fn begin(&self, t_id: u64) {
        self.replica.begin(t_id);
    }

    async fn get(&self, t_id: u64, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.replica.get(t_id, key))
    }

    async fn prepare(&self, t_id: u64, proposed_ts: Timestamp, writes: &[(Vec<u8>, Vec<u8>)]) -> PrepareReply {
        self.replica.prepare(t_id, proposed_ts, writes)
    }

    async fn commit(&self, t_id: u64, commit_ts: Timestamp) {
        self.replica.commit(t_id, commit_ts);
    }

    async fn abort(&self, t_id: u64) {
        self.replica.abort(t_id);
    }
}

/// Wraps `AtomicTimestampOracle` behind `TimestampTransport` for OCC mode.
pub struct LocalTimestampTransport {
    oracle: Arc<AtomicTimestampOracle>,
}

impl LocalTimestampTransport {
    pub fn new(oracle: Arc<AtomicTimestampOracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl TimestampTransport for LocalTimestampTransport {
    async fn allocate(&self) -> Result<Timestamp> {
        Ok(self.oracle.allocate())
    }
}

/// An always-unreachable timestamp transport, used to exercise the
/// oracle-unavailable error path (spec §7).
pub struct UnreachableTimestampTransport;

#[async_trait]
impl TimestampTransport for UnreachableTimestampTransport {
    async fn allocate(&self) -> Result<Timestamp> {
        Err(Error::OracleUnavailable)
    }
}
