use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kv::store::VersionedStore;
use kv::timestamp::Timestamp;

fn populate(n: u64) -> VersionedStore {
    let mut store = VersionedStore::new();
    for i in 0..n {
        store.put(b"k", vec![i as u8], Timestamp(i + 1));
    }
    store
}

fn criterion_benchmark(c: &mut Criterion) {
    let store = populate(1_000);
    c.bench_function("get_at latest of 1000 versions", |b| {
        b.iter(|| store.get_at(black_box(b"k"), black_box(Timestamp(1_000))))
    });

    c.bench_function("put 1000 sequential versions", |b| {
        b.iter(|| populate(black_box(1_000)));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
