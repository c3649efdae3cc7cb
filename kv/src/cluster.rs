//! `LocalCluster`: an in-process group of `ShardReplica`s wired up with
//! `LocalShardTransport`, for tests, the CLI, and the demo binary. Stands
//! in for a real deployment's N independently-replicated shard groups.

use crate::local_transport::LocalShardTransport;
use crate::replica::ShardReplica;
use crate::timestamp::Timestamp;
use crate::transport::ShardTransport;
use std::sync::Arc;

pub struct LocalCluster {
    replicas: Vec<Arc<ShardReplica>>,
}

impl LocalCluster {
    pub fn new(nshards: usize) -> Self {
        assert!(nshards > 0, "a cluster needs at least one shard");
        let replicas = (0..nshards).map(|_| Arc::new(ShardReplica::new())).collect();
        Self { replicas }
    }

    pub fn nshards(&self) -> usize {
        self.replicas.len()
    }

    /// One `ShardTransport` per shard, in shard-index order, suitable for
    /// handing straight to `TransactionCoordinator::new`.
    pub fn shard_transports(&self) -> Vec<Arc<dyn ShardTransport>> {
        self.replicas
            .iter()
            .map(|r| Arc::new(LocalShardTransport::new(r.clone())) as Arc<dyn ShardTransport>)
            .collect()
    }

    /// Diagnostic read of a shard's latest committed version of `key`,
    /// bypassing the coordinator entirely. Used by the CLI `status`
    /// command and tests that want to assert on post-commit state.
    pub fn get_latest(&self, shard: usize, key: &[u8]) -> Option<(Timestamp, Vec<u8>)> {
        self.replicas[shard].get_latest(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_shard_gets_an_independent_transport() {
        let cluster = LocalCluster::new(3);
        assert_eq!(cluster.shard_transports().len(), 3);
    }
}
