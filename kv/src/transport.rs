//! The narrow seam between the coordinator core and the network. Network
//! transport plumbing, per-shard RPC stubs, and replica-side consensus are
//! all out of scope (spec §1 Non-goals); `ShardTransport` is the interface
//! the coordinator consumes instead of talking to sockets directly. A real
//! deployment implements this trait over whatever RPC layer fronts the
//! replica group (the C++ source's `specpaxos`/VR transport). This crate
//! ships one concrete implementation, `LocalTransport` (see
//! `local_transport.rs`), for tests and the CLI demo.

use crate::timestamp::Timestamp;
use async_trait::async_trait;

/// Status codes returned to the coordinator (spec §6). `Timeout` is kept
/// distinct from `Retry` at the transport boundary so a transport can log
/// the difference, but the coordinator's reduce step treats them
/// identically -- see spec §9's "retry classification" open question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Fail,
    Retry,
    Timeout,
}

impl ReplyStatus {
    /// True for any non-`Ok`, non-`Fail` reply -- the fused RETRY/TIMEOUT
    /// class spec §9 keeps together to match the original source's
    /// observable behavior.
    pub fn is_retryable(self) -> bool {
        matches!(self, ReplyStatus::Retry | ReplyStatus::Timeout)
    }
}

/// A shard's reply to `Prepare`: a status plus the earliest timestamp at
/// which the shard can safely commit the transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrepareReply {
    pub status: ReplyStatus,
    pub proposed_ts: Timestamp,
}

/// One shard's conduit for a single transaction's traffic, as seen by the
/// coordinator. A `BufferClient` drives one of these per participant.
#[async_trait]
pub trait ShardTransport: Send + Sync {
    async fn begin(&self, t_id: u64);

    async fn get(&self, t_id: u64, key: &[u8]) -> Result<Option<Vec<u8>>, crate::error::Error>;

    /// Sends the transaction's buffered write set along with the prepare
    /// request. Per spec §4.2, writes are buffered at the `BufferClient`
    /// and deferred until prepare -- there is no separate per-`Put` RPC.
    async fn prepare(
        &self,
        t_id: u64,
        proposed_ts: Timestamp,
        writes: &[(Vec<u8>, Vec<u8>)],
    ) -> PrepareReply;

    async fn commit(&self, t_id: u64, commit_ts: Timestamp);

    async fn abort(&self, t_id: u64);
}

/// The coordinator-external timestamp allocator used only in OCC mode
/// (spec §4.4), reached the same way a shard is.
#[async_trait]
pub trait TimestampTransport: Send + Sync {
    async fn allocate(&self) -> Result<Timestamp, crate::error::Error>;
}
