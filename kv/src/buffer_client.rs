//! `BufferClient`: the per-shard, per-transaction buffer described in spec
//! §4.2. It is the sole conduit for one transaction's traffic to one shard.
//! Reads check the local write buffer first, so a transaction sees its own
//! writes before they're visible anywhere else; writes never leave the
//! buffer until `prepare` ships them.

use crate::error::Result;
use crate::timestamp::Timestamp;
use crate::transport::{PrepareReply, ShardTransport};
use std::collections::HashMap;
use std::sync::Arc;

pub struct BufferClient {
    transport: Arc<dyn ShardTransport>,
    t_id: u64,
    writes: HashMap<Vec<u8>, Vec<u8>>,
}

impl BufferClient {
    pub fn new(transport: Arc<dyn ShardTransport>) -> Self {
        Self { transport, t_id: 0, writes: HashMap::new() }
    }

    pub async fn begin(&mut self, t_id: u64) {
        self.t_id = t_id;
        self.writes.clear();
        self.transport.begin(t_id).await;
    }

    /// Read-your-writes within the transaction; otherwise forwarded to the
    /// shard.
    pub async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(value) = self.writes.get(key) {
            return Ok(Some(value.clone()));
        }
        self.transport.get(self.t_id, key).await
    }

    /// Buffers the write locally. No network traffic happens here -- see
    /// module docs.
    pub fn put(&mut self, key: &[u8], value: Vec<u8>) {
        self.writes.insert(key.to_vec(), value);
    }

    pub async fn prepare(&self, proposed_ts: Timestamp) -> PrepareReply {
        let writes: Vec<(Vec<u8>, Vec<u8>)> =
            self.writes.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        self.transport.prepare(self.t_id, proposed_ts, &writes).await
    }

    pub async fn commit(&self, commit_ts: Timestamp) {
        self.transport.commit(self.t_id, commit_ts).await;
    }

    pub async fn abort(&self) {
        self.transport.abort(self.t_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_transport::LocalShardTransport;
    use crate::replica::ShardReplica;
    use crate::transport::ReplyStatus;
    use std::sync::Arc;

    fn client() -> BufferClient {
        let replica = Arc::new(ShardReplica::new());
        BufferClient::new(Arc::new(LocalShardTransport::new(replica)))
    }

    #[tokio::test]
    async fn read_your_writes_is_served_locally() {
        let mut c = client();
        c.begin(1).await;
        c.put(b"x", b"1".to_vec());
        assert_eq!(c.get(b"x").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn a_fresh_read_of_an_absent_key_is_forwarded_and_returns_none() {
        let mut c = client();
        c.begin(1).await;
        assert_eq!(c.get(b"never-written").await.unwrap(), None);
    }

    #[tokio::test]
    async fn prepare_ships_the_buffered_write_set() {
        let mut c = client();
        c.begin(1).await;
        c.put(b"x", b"1".to_vec());
        let reply = c.prepare(Timestamp(0)).await;
        assert_eq!(reply.status, ReplyStatus::Ok);
    }
}
