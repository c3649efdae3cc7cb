//! `TransactionCoordinator`: the client-facing API (spec §4.5). Tracks
//! participating shards, runs two-phase commit, computes the commit
//! timestamp, and enforces commit-wait when required.

use crate::buffer_client::BufferClient;
use crate::error::{Error, Result};
use crate::timestamp::Timestamp;
use crate::transport::{ReplyStatus, ShardTransport, TimestampTransport};
use crate::truetime::TrueTimeOracle;
use rand::Rng;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Concurrency-control mode (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// External timestamp oracle.
    Occ,
    /// Strict 2PL on the shard; timestamp is the max of prepare responses.
    Lock,
    /// TrueTime commit-wait variant of `Occ`.
    SpanOcc,
    /// TrueTime commit-wait variant of `Lock`.
    SpanLock,
}

impl Mode {
    fn uses_timestamp_oracle(self) -> bool {
        matches!(self, Mode::Occ | Mode::SpanOcc)
    }

    fn uses_commit_wait(self) -> bool {
        matches!(self, Mode::SpanOcc | Mode::SpanLock)
    }
}

/// Upper bound on Prepare-phase retries before the transaction is treated
/// as failed (spec §4.5 step 4). Not prescribed by the spec; chosen to
/// match the order of magnitude of the original source's retry loop.
pub const COMMIT_RETRIES: usize = 3;

const GET_TIMEOUT: Duration = Duration::from_millis(500);
const PUT_TIMEOUT: Duration = Duration::from_millis(500);
const PREPARE_TIMEOUT: Duration = Duration::from_millis(1000);

/// `Ok`/`Fail`/`Retry` reduced across every participant's prepare reply,
/// plus the final commit timestamp (spec §4.5 step 3, invariant 6).
struct Reduced {
    status: ReplyStatus,
    ts: Timestamp,
}

pub struct TransactionCoordinator {
    client_id: u64,
    t_id: u64,
    mode: Mode,
    participants: HashSet<usize>,
    /// Diagnostic duration of the most recent commit-wait; `None` outside
    /// `SPAN_*` modes or before the first commit.
    pub commit_sleep: Option<Duration>,
    bclients: Vec<BufferClient>,
    truetime: Arc<dyn TrueTimeOracle>,
    timestamp_transport: Option<Arc<dyn TimestampTransport>>,
}

impl TransactionCoordinator {
    /// `shard_transports[i]` is the transport this coordinator uses to
    /// reach shard `i`. `timestamp_transport` must be `Some` in `OCC`/
    /// `SPAN_OCC` modes and is otherwise ignored.
    pub fn new(
        mode: Mode,
        shard_transports: Vec<Arc<dyn ShardTransport>>,
        truetime: Arc<dyn TrueTimeOracle>,
        timestamp_transport: Option<Arc<dyn TimestampTransport>>,
    ) -> Self {
        assert!(!shard_transports.is_empty(), "a coordinator needs at least one shard");
        if mode.uses_timestamp_oracle() {
            assert!(timestamp_transport.is_some(), "{mode:?} requires a timestamp oracle transport");
        }

        // A uniformly random non-zero 64-bit client id, per spec §6.
        let mut rng = rand::thread_rng();
        let mut client_id: u64 = 0;
        while client_id == 0 {
            client_id = rng.gen();
        }

        let bclients = shard_transports.into_iter().map(BufferClient::new).collect();

        Self {
            client_id,
            t_id: (client_id / 10_000) * 10_000,
            mode,
            participants: HashSet::new(),
            commit_sleep: None,
            bclients,
            truetime,
            timestamp_transport,
        }
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    pub fn t_id(&self) -> u64 {
        self.t_id
    }

    fn nshards(&self) -> usize {
        self.bclients.len()
    }

    /// Deterministic key routing (spec §6): the same hash a shard-aware
    /// client and the shards themselves must agree on. `DefaultHasher` is
    /// seeded with fixed keys, so this is stable for the lifetime of a
    /// process -- sufficient here since shard assignment only needs to
    /// agree between this in-process coordinator and its own replicas.
    fn key_to_shard(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.nshards() as u64) as usize
    }

    /// IDLE -> ACTIVE. Bumps `t_id`, clears `participants` -- a coordinator
    /// must never reuse a participant set across transactions -- and sends
    /// every shard's `BufferClient` the new `t_id`, regardless of whether
    /// this transaction ends up touching it (spec §4.5).
    pub async fn begin(&mut self) {
        self.t_id += 1;
        self.participants.clear();
        self.commit_sleep = None;
        for shard in 0..self.nshards() {
            self.bclients[shard].begin(self.t_id).await;
        }
    }

    /// Registers `shard` as a participant the first time it's touched by
    /// this transaction. `Begin` was already sent to every shard in
    /// `begin()`, so this only grows the set that `prepare`/`commit`/`abort`
    /// address.
    fn touch(&mut self, shard: usize) {
        self.participants.insert(shard);
    }

    pub async fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let shard = self.key_to_shard(key);
        self.touch(shard);

        match tokio::time::timeout(GET_TIMEOUT, self.bclients[shard].get(key)).await {
            Ok(reply) => reply,
            Err(_) => Err(Error::Transport("GET timed out".into())),
        }
    }

    /// Buffers the write at its shard's `BufferClient`. Per spec §4.5 this
    /// need not await shard acknowledgement, but still surfaces local
    /// buffering failures.
    pub async fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        let shard = self.key_to_shard(key);
        self.touch(shard);

        match tokio::time::timeout(PUT_TIMEOUT, async { self.bclients[shard].put(key, value) }).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::Transport("PUT timed out".into())),
        }
    }

    /// Runs the full two-phase commit algorithm (spec §4.5 steps 1-7).
    /// Returns `true` iff the transaction reached `COMMITTED`.
    pub async fn commit(&mut self) -> bool {
        log::debug!("PREPARE transaction {}", self.t_id);

        let mut reduced = Reduced { status: ReplyStatus::Retry, ts: Timestamp::ZERO };
        for attempt in 0..COMMIT_RETRIES {
            reduced = self.prepare_round().await;
            if matches!(reduced.status, ReplyStatus::Ok | ReplyStatus::Fail) {
                break;
            }
            log::debug!("prepare round {} for transaction {} was retryable, retrying", attempt, self.t_id);
        }

        if reduced.status != ReplyStatus::Ok {
            self.abort().await;
            return false;
        }

        let mut ts = reduced.ts;
        if self.mode.uses_commit_wait() {
            ts = self.commit_wait(ts).await;
        }

        log::debug!("COMMIT transaction {} at {}", self.t_id, ts);
        for &p in &self.participants {
            self.bclients[p].commit(ts).await;
        }
        true
    }

    /// One round of the Prepare phase: dispatches `Prepare` to every
    /// participant in parallel, and -- in `OCC` modes -- concurrently
    /// fetches a timestamp from the oracle (spec §4.5 steps 1-3).
    async fn prepare_round(&self) -> Reduced {
        let prepares = self.participants.iter().map(|&p| {
            let bclient = &self.bclients[p];
            async move {
                match tokio::time::timeout(PREPARE_TIMEOUT, bclient.prepare(Timestamp::ZERO)).await {
                    Ok(reply) => reply,
                    Err(_) => crate::transport::PrepareReply {
                        status: ReplyStatus::Timeout,
                        proposed_ts: Timestamp::ZERO,
                    },
                }
            }
        });

        let oracle_fut = async {
            if !self.mode.uses_timestamp_oracle() {
                return None;
            }
            let transport = self.timestamp_transport.as_ref().expect("checked in new()");
            match tokio::time::timeout(PREPARE_TIMEOUT, transport.allocate()).await {
                Ok(Ok(ts)) => Some(Ok(ts)),
                Ok(Err(e)) => Some(Err(e)),
                Err(_) => Some(Err(Error::OracleUnavailable)),
            }
        };

        let (replies, oracle_reply) = tokio::join!(futures::future::join_all(prepares), oracle_fut);

        let mut status = ReplyStatus::Ok;
        let mut ts = Timestamp::ZERO;
        let mut any_fail = false;
        let mut any_retry = false;
        for reply in replies {
            match reply.status {
                ReplyStatus::Fail => any_fail = true,
                ReplyStatus::Retry | ReplyStatus::Timeout => any_retry = true,
                ReplyStatus::Ok => {}
            }
            ts = ts.max(reply.proposed_ts);
        }
        if let Some(oracle_reply) = oracle_reply {
            match oracle_reply {
                Ok(oracle_ts) => ts = ts.max(oracle_ts),
                Err(_) => any_retry = true,
            }
        }

        if any_fail {
            status = ReplyStatus::Fail;
        } else if any_retry {
            status = ReplyStatus::Retry;
        }

        Reduced { status, ts }
    }

    /// Commit-wait (spec §4.5 step 5, SPAN_* modes only): sleeps out
    /// TrueTime's uncertainty so that `ts` is strictly in the past of real
    /// time at every correctly-clocked replica by the time `Commit`
    /// messages go out. Returns the commit timestamp unchanged -- the wait
    /// affects only when the broadcast happens, not the chosen timestamp.
    async fn commit_wait(&mut self, ts: Timestamp) -> Timestamp {
        let (now, mut err) = self.truetime.now_with_error();
        if now <= ts {
            let diff = ts.micros_since(now);
            err = Timestamp(err.0 + diff);
        }

        let wait_micros = err.0;
        self.commit_sleep = Some(Duration::from_micros(wait_micros));
        log::debug!("commit wait sleep: {wait_micros}us");
        if wait_micros > 1_000_000 {
            log::warn!("sleeping for too long! {wait_micros}us; now={now}, ts={ts}");
        }

        let start = Instant::now();
        if wait_micros > 150 {
            tokio::time::sleep(Duration::from_micros(wait_micros - 150)).await;
        }
        // Fine-grained busy-wait for the last 150us, matching the original
        // source's `usleep(err-150)` followed by a `gettimeofday` spin.
        // Run on a blocking thread so it doesn't stall the async executor.
        tokio::task::spawn_blocking(move || {
            while start.elapsed().as_micros() as u64 <= wait_micros {
                std::hint::spin_loop();
            }
        })
        .await
        .expect("commit-wait spin task panicked");

        ts
    }

    /// Broadcasts `Abort` to every participant. Always succeeds from the
    /// coordinator's perspective, and is idempotent.
    pub async fn abort(&mut self) {
        log::debug!("ABORT transaction {}", self.t_id);
        for &p in &self.participants {
            self.bclients[p].abort().await;
        }
    }
}
