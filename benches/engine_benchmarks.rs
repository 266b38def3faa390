#![allow(clippy::expect_used, missing_docs)]

use std::{hint::black_box, sync::Arc, thread, time::Duration};

use booking_lifecycle::{BookingEngine, EngineConfig};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

/// Short runs so the whole suite stays quick
fn custom_criterion() -> Criterion {
    Criterion::default()
        .sample_size(10)
        .measurement_time(Duration::from_secs(1))
        .warm_up_time(Duration::from_secs(1))
}

/// Engine without the logging observers
fn quiet_engine() -> BookingEngine {
    BookingEngine::new(&EngineConfig::default().with_builtin_observers(false))
}

/// Single-booking operations, parallel lifecycles and listing
fn engine_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("BookingEngine Operations");

    group.bench_function("create", |b| {
        let engine = quiet_engine();
        b.iter(|| black_box(engine.create_booking("Alice", "Plumbing")));
    });

    group.bench_function("full_lifecycle", |b| {
        let engine = quiet_engine();
        b.iter(|| {
            let id = engine.create_booking("Alice", "Plumbing").id();
            engine.assign(id).expect("assign");
            engine.accept(id).expect("accept");
            black_box(engine.complete(id).expect("complete"));
        });
    });

    group.bench_function("rejected_transition", |b| {
        let engine = quiet_engine();
        let id = engine.create_booking("Carol", "Cleaning").id();
        b.iter(|| black_box(engine.complete(id).is_err()));
    });

    group.bench_function("parallel_lifecycles_4_threads", |b| {
        b.iter_batched(
            || Arc::new(quiet_engine()),
            |engine| {
                let handles: Vec<_> = (0..4)
                    .map(|_| {
                        let engine = Arc::clone(&engine);
                        thread::spawn(move || {
                            for _ in 0..50 {
                                let id = engine.create_booking("Bob", "Electrical").id();
                                engine.assign(id).expect("assign");
                                engine.reject(id).expect("reject");
                                engine.retry(id).expect("retry");
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().expect("worker panicked");
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("list_1000", |b| {
        let engine = quiet_engine();
        for i in 0..1000 {
            engine.create_booking(format!("customer-{i}"), "Plumbing");
        }
        b.iter(|| black_box(engine.list().len()));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = custom_criterion();
    targets = engine_bench
}
criterion_main!(benches);
