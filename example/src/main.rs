use std::sync::Arc;

use kv::cluster::LocalCluster;
use kv::coordinator::{Mode, TransactionCoordinator};
use kv::local_transport::LocalTimestampTransport;
use kv::timestamp_oracle::AtomicTimestampOracle;
use kv::transport::TimestampTransport;
use kv::truetime::SystemTrueTime;

#[tokio::main]
async fn main() {
    println!("Hello, kv demo!");

    run().await;

    println!("Bye~");
}

async fn run() {
    let cluster = LocalCluster::new(4);
    let truetime = Arc::new(SystemTrueTime::new(5_000));
    let timestamp_transport =
        Some(Arc::new(LocalTimestampTransport::new(Arc::new(AtomicTimestampOracle::new()))) as Arc<dyn TimestampTransport>);

    let mut coordinator =
        TransactionCoordinator::new(Mode::SpanOcc, cluster.shard_transports(), truetime, timestamp_transport);

    coordinator.begin().await;
    coordinator.put(b"b", vec![0x01]).await.unwrap();
    coordinator.put(b"b", vec![0x02]).await.unwrap();
    coordinator.put(b"e", vec![0x05]).await.unwrap();
    coordinator.put(b"c", vec![0x03]).await.unwrap();
    coordinator.put(b"", vec![]).await.unwrap();
    coordinator.put(b"a", vec![0x01]).await.unwrap();
    coordinator.put(b"d", vec![0x04]).await.unwrap();
    assert!(coordinator.commit().await);

    coordinator.begin().await;
    let b = coordinator.get(b"b").await.unwrap();
    assert_eq!(b, Some(vec![0x02]));
    assert!(coordinator.commit().await);

    println!("committed {{b: 0x02, e: 0x05, c: 0x03, '': [], a: 0x01, d: 0x04}}");
}
