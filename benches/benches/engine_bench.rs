//! # Engine Benchmarks
//!
//! Mede o caminho quente da fachada: sincronização de lotes, ciclos de
//! recuperação e o bus de eventos.
//!
//! Run: `cargo bench --bench engine_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qns_core::{ChannelId, NetEvent, NetEventBus, NetworkConfig, StateUnit};
use qns_orchestration::SyncEngine;

fn quiet_engine() -> SyncEngine {
    SyncEngine::new(NetworkConfig::default().with_recovery_interval_ms(3_600_000))
}

/// Benchmark da sincronização de lotes de unidades
fn bench_synchronize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronize");

    let engine = quiet_engine();
    let id = engine.initialize_network(&[2, 2, 3, 4]).unwrap();
    let batch: Vec<StateUnit> = (1..=64)
        .map(|i| StateUnit::new(i, 2, 1_000, 0.1 * i as f64))
        .collect();

    group.bench_function("batch_64", |b| {
        b.iter(|| black_box(engine.synchronize_states(id, &batch, &[2, 3, 4]).unwrap()))
    });

    group.finish();
}

/// Benchmark de um ciclo de recuperação com uma quebra forçada
fn bench_recovery_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("recovery");

    let engine = quiet_engine();
    let id = engine.initialize_network(&[2, 2, 2, 2]).unwrap();

    group.bench_function("cycle_one_breakage", |b| {
        b.iter(|| {
            // Pior caso: força a quebra, depois o ciclo repara
            let weakest = engine.snapshot(id).unwrap().channels[0].id;
            engine.report_fidelity(id, weakest, 0.3).unwrap();
            black_box(engine.resolve_conflicts(id, Vec::new()).unwrap())
        })
    });

    group.finish();
}

/// Benchmark do bus de eventos
fn bench_event_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_bus");

    let bus = NetEventBus::new();
    group.bench_function("emit", |b| {
        b.iter(|| {
            let _ = bus.emit(NetEvent::ChannelDegraded {
                channel: ChannelId(1),
                fidelity: 0.8,
            });
        })
    });

    group.finish();
}

criterion_group!(benches, bench_synchronize, bench_recovery_cycle, bench_event_bus);
criterion_main!(benches);
