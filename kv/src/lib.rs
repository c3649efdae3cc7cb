//! `kv` is the client-side core of a sharded, replicated, transactional
//! key-value store: a multi-version per-shard store (`store`) and a
//! `TransactionCoordinator` that runs two-phase commit across shards with
//! pluggable concurrency control, including Spanner-style TrueTime
//! commit-wait.
//!
//! ## Getting started
//!
//! ```rust
//! use std::sync::Arc;
//! use kv::coordinator::{Mode, TransactionCoordinator};
//! use kv::local_transport::{LocalShardTransport, LocalTimestampTransport};
//! use kv::replica::ShardReplica;
//! use kv::timestamp_oracle::AtomicTimestampOracle;
//! use kv::transport::ShardTransport;
//! use kv::truetime::SystemTrueTime;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let shards: Vec<Arc<dyn ShardTransport>> =
//!     vec![Arc::new(LocalShardTransport::new(Arc::new(ShardReplica::new())))];
//! let oracle = Arc::new(LocalTimestampTransport::new(Arc::new(AtomicTimestampOracle::new())));
//! let mut coordinator = TransactionCoordinator::new(
//!     Mode::Occ,
//!     shards,
//!     Arc::new(SystemTrueTime::new(1000)),
//!     Some(oracle),
//! );
//!
//! coordinator.begin().await;
//! coordinator.put(b"a", vec![0x01]).await.unwrap();
//! assert!(coordinator.commit().await);
//! # }
//! ```

pub mod buffer_client;
pub mod cluster;
pub mod coordinator;
pub mod error;
pub mod local_transport;
pub mod replica;
pub mod store;
pub mod timestamp;
pub mod timestamp_oracle;
pub mod transport;
pub mod truetime;
