use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use tickbus_events::Tick;
use tickbus_perf::{sample_tick, scratch_ring};
use tickbus_ring::{RingConfig, RingObserver, RingProducer};

fn bench_push(c: &mut Criterion) {
    let path = scratch_ring("crit_push");
    let mut producer = RingProducer::<Tick>::create(&path, RingConfig::new(65536))
        .expect("failed to create producer");
    let tick = sample_tick(1);

    let mut group = c.benchmark_group("broadcast");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push", |b| {
        b.iter(|| producer.push(black_box(tick)));
    });

    drop(group);
    drop(producer);
    let _ = std::fs::remove_file(&path);
}

fn bench_try_get_data(c: &mut Criterion) {
    let path = scratch_ring("crit_get");
    let mut producer = RingProducer::<Tick>::create(&path, RingConfig::new(65536))
        .expect("failed to create producer");
    let observer = RingObserver::<Tick>::open(&path).expect("failed to attach observer");
    let tick = sample_tick(1);

    let mut group = c.benchmark_group("broadcast");
    group.throughput(Throughput::Elements(1));

    group.bench_function("try_get (data)", |b| {
        b.iter_custom(|iters| {
            // Pre-fill
            for _ in 0..iters {
                producer.push(tick);
            }
            let start = std::time::Instant::now();
            for _ in 0..iters {
                if black_box(observer.try_get()).is_some() {
                    observer.advance();
                }
            }
            start.elapsed()
        });
    });

    drop(group);
    drop(producer);
    drop(observer);
    let _ = std::fs::remove_file(&path);
}

fn bench_try_get_empty(c: &mut Criterion) {
    let path = scratch_ring("crit_empty");
    let _producer = RingProducer::<Tick>::create(&path, RingConfig::new(65536))
        .expect("failed to create producer");
    let observer = RingObserver::<Tick>::open(&path).expect("failed to attach observer");

    let mut group = c.benchmark_group("broadcast");
    group.throughput(Throughput::Elements(1));

    group.bench_function("try_get (empty)", |b| {
        b.iter(|| black_box(observer.try_get()));
    });

    drop(group);
    drop(_producer);
    drop(observer);
    let _ = std::fs::remove_file(&path);
}

fn bench_round_trip(c: &mut Criterion) {
    let path = scratch_ring("crit_rt");
    let mut producer = RingProducer::<Tick>::create(&path, RingConfig::new(65536))
        .expect("failed to create producer");
    let observer = RingObserver::<Tick>::open(&path).expect("failed to attach observer");
    let tick = sample_tick(1);

    let mut group = c.benchmark_group("broadcast");
    group.throughput(Throughput::Elements(1));

    group.bench_function("round_trip", |b| {
        b.iter(|| {
            producer.push(black_box(tick));
            if black_box(observer.try_get()).is_some() {
                observer.advance();
            }
        });
    });

    drop(group);
    drop(producer);
    drop(observer);
    let _ = std::fs::remove_file(&path);
}

fn bench_throughput_capacities(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast_capacity");
    group.throughput(Throughput::Elements(1));

    for &cap in &[1024usize, 4096, 16384, 65536] {
        let path = scratch_ring(&format!("crit_cap_{cap}"));
        let mut producer = RingProducer::<Tick>::create(&path, RingConfig::new(cap))
            .expect("failed to create producer");
        let observer = RingObserver::<Tick>::open(&path).expect("failed to attach observer");
        let tick = sample_tick(1);

        group.bench_function(format!("round_trip_cap_{cap}"), |b| {
            b.iter(|| {
                producer.push(black_box(tick));
                if black_box(observer.try_get()).is_some() {
                    observer.advance();
                }
            });
        });

        drop(producer);
        drop(observer);
        let _ = std::fs::remove_file(&path);
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_push,
    bench_try_get_data,
    bench_try_get_empty,
    bench_round_trip,
    bench_throughput_capacities,
);
criterion_main!(benches);
