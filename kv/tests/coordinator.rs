use std::sync::Arc;
use std::time::Duration;

use kv::cluster::LocalCluster;
use kv::coordinator::{Mode, TransactionCoordinator};
use kv::local_transport::LocalTimestampTransport;
use kv::timestamp::Timestamp;
use kv::timestamp_oracle::AtomicTimestampOracle;
use kv::transport::TimestampTransport;
use kv::truetime::SystemTrueTime;

fn occ_coordinator(cluster: &LocalCluster) -> TransactionCoordinator {
    let oracle = Arc::new(LocalTimestampTransport::new(Arc::new(AtomicTimestampOracle::new())));
    TransactionCoordinator::new(
        Mode::Occ,
        cluster.shard_transports(),
        Arc::new(SystemTrueTime::new(1_000)),
        Some(oracle as Arc<dyn TimestampTransport>),
    )
}

#[tokio::test]
async fn s1_single_key_read_your_writes_then_commit_is_visible_on_the_shard() {
    let cluster = LocalCluster::new(1);
    let mut c = occ_coordinator(&cluster);

    c.begin().await;
    c.put(b"x", b"1".to_vec()).await.unwrap();
    c.put(b"x", b"2".to_vec()).await.unwrap();
    assert_eq!(c.get(b"x").await.unwrap(), Some(b"2".to_vec()));
    assert!(c.commit().await);

    let (_, value) = cluster.get_latest(0, b"x").expect("committed write must be visible");
    assert_eq!(value, b"2".to_vec());
}

#[tokio::test]
async fn a_read_of_a_key_another_transaction_committed_sees_the_latest_value() {
    let cluster = LocalCluster::new(1);
    let mut writer = occ_coordinator(&cluster);
    writer.begin().await;
    writer.put(b"k", b"v1".to_vec()).await.unwrap();
    assert!(writer.commit().await);

    let mut reader = occ_coordinator(&cluster);
    reader.begin().await;
    assert_eq!(reader.get(b"k").await.unwrap(), Some(b"v1".to_vec()));
    assert!(reader.commit().await);
}

#[tokio::test]
async fn aborting_a_transaction_leaves_no_trace_on_the_shard() {
    let cluster = LocalCluster::new(1);
    let mut c = occ_coordinator(&cluster);
    c.begin().await;
    c.put(b"never-committed", b"1".to_vec()).await.unwrap();
    c.abort().await;

    assert_eq!(cluster.get_latest(0, b"never-committed"), None);
}

#[tokio::test]
async fn span_occ_commits_across_multiple_shards_with_commit_wait() {
    let cluster = LocalCluster::new(8);
    let oracle = Arc::new(LocalTimestampTransport::new(Arc::new(AtomicTimestampOracle::new())));
    let mut c = TransactionCoordinator::new(
        Mode::SpanOcc,
        cluster.shard_transports(),
        Arc::new(SystemTrueTime::new(2_000)),
        Some(oracle as Arc<dyn TimestampTransport>),
    );

    c.begin().await;
    for i in 0..8u8 {
        c.put(&[i], vec![i]).await.unwrap();
    }
    assert!(c.commit().await);
    assert!(c.commit_sleep.unwrap() >= Duration::from_micros(0));

    for i in 0..8u8 {
        let shard_with_key = (0..cluster.nshards()).find(|&s| cluster.get_latest(s, &[i]).is_some());
        assert!(shard_with_key.is_some(), "key {i} must have landed on some shard");
    }
}

#[tokio::test]
async fn lock_mode_does_not_require_a_timestamp_oracle() {
    let cluster = LocalCluster::new(2);
    let mut c = TransactionCoordinator::new(
        Mode::Lock,
        cluster.shard_transports(),
        Arc::new(SystemTrueTime::new(0)),
        None,
    );
    c.begin().await;
    c.put(b"only-key", b"v".to_vec()).await.unwrap();
    assert!(c.commit().await);
}

#[tokio::test]
async fn timestamps_assigned_across_transactions_on_the_same_key_are_increasing() {
    let cluster = LocalCluster::new(1);

    let mut first = occ_coordinator(&cluster);
    first.begin().await;
    first.put(b"seq", b"1".to_vec()).await.unwrap();
    assert!(first.commit().await);
    let (ts1, _) = cluster.get_latest(0, b"seq").unwrap();

    let mut second = occ_coordinator(&cluster);
    second.begin().await;
    second.put(b"seq", b"2".to_vec()).await.unwrap();
    assert!(second.commit().await);
    let (ts2, _) = cluster.get_latest(0, b"seq").unwrap();

    assert!(ts2 > ts1);
    assert_ne!(ts1, Timestamp::ZERO);
}
