//! Throughput Benchmark for stalecache
//!
//! This benchmark measures the performance of the cache
//! under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use stalecache::{Cache, CacheConfig};
use std::sync::Arc;
use std::time::Duration;

fn expiring_cache() -> Cache<Bytes> {
    Cache::with_config(CacheConfig::new(Duration::from_secs(3600)).with_notifier(false))
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let cache = expiring_cache();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            cache.set(format!("key:{}", i), Bytes::from("small_value"));
            i += 1;
        });
    });

    group.bench_function("set_large", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(64 * 1024)); // 64KB value
        b.iter(|| {
            cache.set(format!("key:{}", i), value.clone());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let cache = expiring_cache();

    // Pre-populate with data
    for i in 0..100_000 {
        cache.set(format!("key:{}", i), Bytes::from(format!("value:{}", i)));
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(cache.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(cache.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let cache = expiring_cache();

    // Pre-populate
    for i in 0..10_000 {
        cache.set(format!("key:{}", i), Bytes::from(format!("value:{}", i)));
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 10_000);
            if i % 5 == 0 {
                // 20% writes
                black_box(cache.replace(&key, Bytes::from("value")).is_ok());
            } else {
                // 80% reads
                black_box(cache.get(&key));
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let cache = Arc::new(expiring_cache());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let cache = Arc::clone(&cache);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            cache.set(key.clone(), Bytes::from("value"));
                            cache.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(cache.item_count());
        });
    });

    group.finish();
}

/// Benchmark purging expired entries
fn bench_delete_expired(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete_expired");

    group.bench_function("purge_10k_all_expired", |b| {
        let cache = Cache::with_config(
            CacheConfig::new(Duration::from_nanos(1)).with_notifier(false),
        );
        b.iter(|| {
            for i in 0..10_000 {
                cache.set(format!("key:{}", i), Bytes::from("value"));
            }
            black_box(cache.delete_expired());
        });
    });

    group.bench_function("scan_10k_none_expired", |b| {
        let cache = expiring_cache();
        for i in 0..10_000 {
            cache.set(format!("key:{}", i), Bytes::from("value"));
        }
        b.iter(|| {
            black_box(cache.delete_expired());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_mixed,
    bench_concurrent,
    bench_delete_expired,
);

criterion_main!(benches);
