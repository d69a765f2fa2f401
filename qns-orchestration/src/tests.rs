//! Testes integrados para qns-orchestration
//!
//! Cenários de ponta a ponta pela fachada `SyncEngine`: ciclo de vida
//! completo da rede, recuperação após colapso de fidelidade e
//! interação entre as camadas de emaranhamento e sincronização.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use qns_core::{ChannelId, EventFilter, NetEvent, NetworkConfig, NetworkId, NodeId, StateUnit};
use qns_sync::{AlgorithmOp, AlgorithmSpec, CommunicationPattern};

use crate::breakage::Breakage;
use crate::engine::{CoherenceRequest, SyncEngine};

/// Intervalo alto mantém a task em background quieta durante o teste
fn quiet_engine() -> SyncEngine {
    SyncEngine::new(NetworkConfig::default().with_recovery_interval_ms(60_000))
}

fn units(count: u64, dimension: u32) -> Vec<StateUnit> {
    (1..=count)
        .map(|id| StateUnit::new(id, dimension, 1_000, 0.1 * id as f64))
        .collect()
}

#[test]
fn test_full_network_lifecycle() {
    let engine = quiet_engine();
    let id = engine.initialize_network(&[2, 2, 3, 4]).unwrap();

    // Malha completa saudável
    let snapshot = engine.snapshot(id).unwrap();
    assert_eq!(snapshot.nodes.len(), 4);
    assert_eq!(snapshot.channels.len(), 6);
    assert!(snapshot.channels.iter().all(|c| c.fidelity() >= 0.9));

    // Sincronização de um lote inteiro
    let batch = units(8, 2);
    let report = engine.synchronize_states(id, &batch, &[2, 3, 4]).unwrap();
    assert_eq!(report.synchronized_ids.len(), 8);
    assert!(report.failed_ids.is_empty());
    assert!(report.avg_fidelity >= 0.9);

    // Manutenção sem estouro de deadline
    let request = CoherenceRequest::new(units(2, 2), 0.5);
    let maintenance = engine.maintain_coherence(id, &request).unwrap();
    assert!(!maintenance.timed_out);
    assert!(maintenance.report.overall_quality >= 0.5);

    // Teleporte por um canal ativo
    let outcome = engine
        .teleport(id, &StateUnit::new(1, 2, 1_000, 0.0), ChannelId(1))
        .unwrap();
    assert!(outcome.result_fidelity > 0.0);

    engine.teardown(id).unwrap();
    assert!(engine.snapshot(id).is_err());
}

#[test]
fn test_recovery_scenario_through_engine() {
    // Quatro nós, seis canais ≥ 0.9; força um a 0.3 e roda um ciclo.
    // Dois desfechos possíveis e nenhum terceiro: substituído (seis
    // canais, todos ≥ 0.9) ou removido (cinco canais).
    let config = NetworkConfig::default().with_recovery_interval_ms(60_000);
    let engine = SyncEngine::new(config.clone());
    let id = engine.initialize_network(&[2, 2, 2, 2]).unwrap();
    assert_eq!(engine.snapshot(id).unwrap().channels.len(), 6);

    engine.report_fidelity(id, ChannelId(3), 0.3).unwrap();
    let conflict = Breakage::from_fidelity(ChannelId(3), 0.3, &config).unwrap();
    let report = engine.resolve_conflicts(id, vec![conflict]).unwrap();

    assert_eq!(report.resolved + report.unresolved, 1);
    assert!(report.reestablished <= report.resolved);

    let snapshot = engine.snapshot(id).unwrap();
    match snapshot.channels.len() {
        6 => {
            assert_eq!(report.reestablished, 1);
            assert!(snapshot.channels.iter().all(|c| c.fidelity() >= 0.9));
        }
        5 => assert_eq!(report.unresolved, 1),
        other => panic!("unexpected channel count {other}"),
    }
}

#[test]
fn test_duplicate_conflicts_accounted_per_conflict() {
    // Dois conflitos para o mesmo canal: um reparo só, mas o relatório
    // presta contas dos dois.
    let config = NetworkConfig::default().with_recovery_interval_ms(60_000);
    let engine = SyncEngine::new(config.clone());
    let id = engine.initialize_network(&[2, 2, 2, 2]).unwrap();

    engine.report_fidelity(id, ChannelId(2), 0.3).unwrap();
    let conflict = Breakage::from_fidelity(ChannelId(2), 0.3, &config).unwrap();
    let report = engine
        .resolve_conflicts(id, vec![conflict.clone(), conflict])
        .unwrap();

    assert_eq!(report.resolved + report.unresolved, 2);
    assert!(report.reestablished <= report.resolved);
    // Um reparo só de fato: a malha não perdeu mais de um canal
    assert!(engine.snapshot(id).unwrap().channels.len() >= 5);
}

#[test]
fn test_empty_conflict_list_reports_zero() {
    // Canal quebrado na rede, lista de conflitos vazia: a varredura
    // ainda trata a quebra, mas o relatório fica em zero.
    let config = NetworkConfig::default().with_recovery_interval_ms(60_000);
    let engine = SyncEngine::new(config);
    let id = engine.initialize_network(&[2, 2, 2]).unwrap();

    engine.report_fidelity(id, ChannelId(1), 0.2).unwrap();
    let report = engine.resolve_conflicts(id, Vec::new()).unwrap();
    assert_eq!(report.resolved + report.unresolved, 0);
    assert_eq!(report.reestablished, 0);

    // A quebra foi tratada mesmo assim: reparada ou removida
    let snapshot = engine.snapshot(id).unwrap();
    assert!(snapshot
        .channels
        .iter()
        .all(|c| c.fidelity() >= NetworkConfig::default().fail_threshold));
}

#[test]
fn test_degraded_channel_fails_only_affected_units() {
    let engine = quiet_engine();
    let id = engine.initialize_network(&[2, 2, 2]).unwrap();

    // Canal 2 quebrado e inativo; unidades mapeadas nele falham,
    // o resto do lote segue.
    engine.report_fidelity(id, ChannelId(2), 0.2).unwrap();
    let batch = units(9, 2);
    let report = engine.synchronize_states(id, &batch, &[2]).unwrap();

    assert_eq!(
        report.synchronized_ids.len() + report.failed_ids.len(),
        batch.len()
    );
    assert!(!report.failed_ids.is_empty());
    assert!(!report.synchronized_ids.is_empty());
}

#[test]
fn test_empty_batch_is_structural_error() {
    let engine = quiet_engine();
    let id = engine.initialize_network(&[2, 2]).unwrap();
    assert!(engine.synchronize_states(id, &[], &[2]).is_err());
    assert!(engine
        .synchronize_states(id, &units(1, 2), &[])
        .is_err());
}

#[test]
fn test_empty_algorithm_trivially_succeeds() {
    let engine = quiet_engine();
    let id = engine.initialize_network(&[2, 2, 2]).unwrap();
    let spec = AlgorithmSpec::new(Vec::new(), CommunicationPattern::AllToAll);
    let result = engine.execute_algorithm(id, &spec).unwrap();
    assert!(result.success);
    assert_eq!(result.communication_overhead, 0);
    assert_eq!(result.completed_ops, 0);
}

#[test]
fn test_algorithm_over_ring_pattern() {
    let engine = quiet_engine();
    let id = engine.initialize_network(&[2, 2, 2, 2]).unwrap();
    let spec = AlgorithmSpec::new(
        vec![
            AlgorithmOp::StatePrep {
                node: NodeId(1),
                dimension: 2,
            },
            AlgorithmOp::LocalCompute {
                node: NodeId(2),
                cost: 3.0,
            },
            AlgorithmOp::Measurement { node: NodeId(3) },
        ],
        CommunicationPattern::Ring,
    );
    let result = engine.execute_algorithm(id, &spec).unwrap();
    assert!(result.success);
    assert_eq!(result.completed_ops, 3);
    // Anel de 4 nós: 4 links × 2 bits clássicos
    assert_eq!(result.communication_overhead, 8);
    assert!(result.node_outputs.contains_key(&NodeId(3)));
}

#[test]
fn test_background_recovery_end_to_end() {
    let config = NetworkConfig::default().with_recovery_interval_ms(5);
    let engine = SyncEngine::new(config.clone());
    let id = engine.initialize_network(&[2, 2, 2]).unwrap();

    engine.report_fidelity(id, ChannelId(1), 0.2).unwrap();
    std::thread::sleep(Duration::from_millis(80));

    // A task em background detectou e tratou a quebra sozinha
    let snapshot = engine.snapshot(id).unwrap();
    assert!(snapshot
        .channels
        .iter()
        .all(|c| c.fidelity() >= config.fail_threshold));
    engine.teardown(id).unwrap();
}

#[test]
fn test_recovery_events_reach_subscribers() {
    let config = NetworkConfig::default().with_recovery_interval_ms(60_000);
    let engine = SyncEngine::new(config.clone());
    let id = engine.initialize_network(&[2, 2]).unwrap();

    let repairs = Arc::new(AtomicUsize::new(0));
    let repairs_clone = repairs.clone();
    engine
        .subscribe(id, EventFilter::Recovery, move |event| {
            if matches!(
                event,
                NetEvent::ChannelRepaired { .. } | NetEvent::ChannelRemoved { .. }
            ) {
                repairs_clone.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

    engine.report_fidelity(id, ChannelId(1), 0.3).unwrap();
    let conflict = Breakage::from_fidelity(ChannelId(1), 0.3, &config).unwrap();
    engine.resolve_conflicts(id, vec![conflict]).unwrap();
    assert_eq!(repairs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_distribution_is_deterministic_under_seed() {
    let make = || {
        let engine = quiet_engine();
        let id = engine.initialize_network(&[2, 3, 4]).unwrap();
        let snapshot = engine.snapshot(id).unwrap();
        snapshot
            .channels
            .iter()
            .map(|c| (c.id, c.fidelity()))
            .collect::<Vec<_>>()
    };
    assert_eq!(make(), make());
}

#[test]
fn test_networks_are_isolated() {
    let engine = quiet_engine();
    let a = engine.initialize_network(&[2, 2, 2]).unwrap();
    let b = engine.initialize_network(&[2, 2, 2]).unwrap();

    engine.report_fidelity(a, ChannelId(1), 0.1).unwrap();

    // A rede b não enxerga a degradação da rede a
    let snapshot_b = engine.snapshot(b).unwrap();
    assert!(snapshot_b.channels.iter().all(|c| c.fidelity() >= 0.9));

    engine.teardown(a).unwrap();
    assert_eq!(engine.network_ids().unwrap(), vec![NetworkId(2)]);
}

#[test]
fn test_teleport_success_rate_is_exact_ratio() {
    let engine = quiet_engine();
    let id = engine.initialize_network(&[2, 2, 2]).unwrap();
    let unit = StateUnit::new(7, 2, 1_000, 0.25);

    for _ in 0..4 {
        engine.teleport(id, &unit, ChannelId(1)).unwrap();
    }
    // Degrada abaixo do threshold de sucesso, mas acima do fail
    engine.report_fidelity(id, ChannelId(1), 0.7).unwrap();
    engine.teleport(id, &unit, ChannelId(1)).unwrap();

    let rate = engine.teleport_success_rate(id, None).unwrap();
    assert!((rate - 4.0 / 5.0).abs() < 1e-9);
    assert_eq!(engine.teleport_success_rate(id, Some(1)).unwrap(), 0.0);
}
