//! Loop de recuperação de conflitos
//!
//! Varre os canais procurando `fidelity < fail_threshold`, classifica
//! cada achado como quebra e processa as quebras em ordem de
//! severidade decrescente (empate: detecção mais antiga primeiro).
//! Cada quebra recebe exatamente um ciclo de reparo:
//!
//! 1. canal substituto do `ChannelDistributor` para o mesmo par;
//! 2. uma passada de `CoherenceMonitor::stabilize`;
//! 3. sucesso ⇔ fidelidade resultante ≥ warn threshold (grafo
//!    atualizado in place); senão o canal sai do grafo.
//!
//! O loop nunca propaga erro ao chamador: todo desfecho vira evento.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use qns_core::{ChannelId, NetEvent, NetEventBus, NetworkConfig, TopologyGraph};
use qns_entanglement::{ChannelDistributor, CoherenceMonitor};

use crate::breakage::{sort_for_processing, Breakage, BreakageCause};

/// Resultado de um ciclo de recuperação
///
/// Invariantes: `resolved + unresolved == quebras processadas` e
/// `reestablished ≤ resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecoveryReport {
    /// Quebras encerradas (reparadas ou já saradas quando processadas)
    pub resolved: usize,
    /// Quebras cujo reparo falhou (canal removido)
    pub unresolved: usize,
    /// Subconjunto de `resolved` onde um canal novo entrou no grafo
    pub reestablished: usize,
}

/// Detecta e repara canais quebrados
#[derive(Debug, Clone)]
pub struct ConflictRecoveryLoop {
    graph: Arc<RwLock<TopologyGraph>>,
    distributor: ChannelDistributor,
    monitor: CoherenceMonitor,
    events: NetEventBus,
    config: NetworkConfig,
    /// Quebras reportadas de fora (timeouts de manutenção)
    pending: Arc<Mutex<Vec<Breakage>>>,
    /// Contador de ciclos (entra na seed da tentativa de reparo)
    cycles: Arc<Mutex<u64>>,
}

impl ConflictRecoveryLoop {
    /// Cria o loop sobre o grafo compartilhado da rede
    pub fn new(
        graph: Arc<RwLock<TopologyGraph>>,
        distributor: ChannelDistributor,
        monitor: CoherenceMonitor,
        events: NetEventBus,
        config: NetworkConfig,
    ) -> Self {
        Self {
            graph,
            distributor,
            monitor,
            events,
            config,
            pending: Arc::new(Mutex::new(Vec::new())),
            cycles: Arc::new(Mutex::new(0)),
        }
    }

    /// Enfileira uma quebra reportada externamente (timeout)
    ///
    /// O próximo ciclo processa a quebra; nunca há retry automático.
    pub fn report_breakage(&self, breakage: Breakage) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(breakage);
        }
    }

    /// Varre o grafo por canais abaixo do fail threshold
    pub fn detect(&self) -> Vec<Breakage> {
        let broken: Vec<(ChannelId, f64)> = {
            let Ok(graph) = self.graph.read() else {
                return Vec::new();
            };
            graph
                .channels()
                .iter()
                .filter(|c| c.fidelity() < self.config.fail_threshold)
                .map(|c| (c.id, c.fidelity()))
                .collect()
        };
        broken
            .into_iter()
            .filter_map(|(channel, fidelity)| {
                let _ = self
                    .events
                    .emit(NetEvent::ChannelBroken { channel, fidelity });
                Breakage::from_fidelity(channel, fidelity, &self.config)
            })
            .collect()
    }

    /// Um ciclo completo: detecção + quebras pendentes + reparo
    pub fn run_cycle(&self) -> RecoveryReport {
        let mut breakages = self.detect();
        if let Ok(mut pending) = self.pending.lock() {
            breakages.append(&mut pending);
        }
        self.process(breakages)
    }

    /// Processa uma lista de quebras (um ciclo de reparo cada)
    ///
    /// O relatório cobre os canais distintos da lista: quebras
    /// repetidas do mesmo canal colapsam num reparo só (vale a de
    /// maior severidade).
    pub fn process(&self, breakages: Vec<Breakage>) -> RecoveryReport {
        Self::tally(self.repair_all(breakages).values().copied())
    }

    /// Ciclo dirigido pelo chamador
    ///
    /// O trabalho de reparo cobre os conflitos fornecidos MAIS as
    /// quebras pendentes e a varredura de detecção (um reparo por
    /// canal), mas o relatório presta contas conflito a conflito:
    /// `resolved + unresolved == conflicts.len()`, sempre. Quebras
    /// achadas só pela varredura são tratadas e ficam de fora do
    /// relatório (saem no evento `RecoveryCycle`).
    pub fn resolve(&self, conflicts: Vec<Breakage>) -> RecoveryReport {
        let mut work = self.detect();
        if let Ok(mut pending) = self.pending.lock() {
            work.append(&mut pending);
        }
        work.extend(conflicts.iter().cloned());

        let outcomes = self.repair_all(work);

        let mut report = RecoveryReport::default();
        for conflict in &conflicts {
            match outcomes.get(&conflict.channel_id) {
                Some(RepairOutcome::Replaced) => {
                    report.resolved += 1;
                    report.reestablished += 1;
                }
                Some(RepairOutcome::Abandoned) => report.unresolved += 1,
                Some(RepairOutcome::Healed) | None => report.resolved += 1,
            }
        }
        report
    }

    /// Reparo deduplicado por canal; desfecho de cada canal tocado
    fn repair_all(&self, mut breakages: Vec<Breakage>) -> HashMap<ChannelId, RepairOutcome> {
        sort_for_processing(&mut breakages);
        let mut seen = HashSet::new();
        breakages.retain(|b| seen.insert(b.channel_id));

        let attempt = {
            let Ok(mut cycles) = self.cycles.lock() else {
                return HashMap::new();
            };
            *cycles += 1;
            *cycles
        };

        let mut outcomes = HashMap::with_capacity(breakages.len());
        for breakage in breakages {
            let outcome = self.repair(&breakage, attempt);
            outcomes.insert(breakage.channel_id, outcome);
        }

        let cycle = Self::tally(outcomes.values().copied());
        let _ = self.events.emit(NetEvent::RecoveryCycle {
            resolved: cycle.resolved,
            unresolved: cycle.unresolved,
            reestablished: cycle.reestablished,
        });
        outcomes
    }

    fn tally(outcomes: impl Iterator<Item = RepairOutcome>) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        for outcome in outcomes {
            match outcome {
                RepairOutcome::Healed => report.resolved += 1,
                RepairOutcome::Replaced => {
                    report.resolved += 1;
                    report.reestablished += 1;
                }
                RepairOutcome::Abandoned => report.unresolved += 1,
            }
        }
        report
    }
}

/// Desfecho de um ciclo de reparo sobre uma quebra
#[derive(Debug, Clone, Copy)]
enum RepairOutcome {
    /// A quebra já não se sustenta (canal sumiu ou fidelidade voltou)
    Healed,
    /// Canal substituto entrou no grafo com fidelidade ≥ warn
    Replaced,
    /// Reparo falhou; canal removido do grafo
    Abandoned,
}

impl ConflictRecoveryLoop {
    /// Exatamente uma tentativa de reparo por quebra por ciclo
    fn repair(&self, breakage: &Breakage, attempt: u64) -> RepairOutcome {
        let _ = self.monitor.mark_recovering(breakage.channel_id);
        let outcome = self.repair_inner(breakage, attempt);
        let _ = self.monitor.clear_recovering(breakage.channel_id);
        outcome
    }

    fn repair_inner(&self, breakage: &Breakage, attempt: u64) -> RepairOutcome {
        // Revalida a quebra sob o read lock: o grafo pode ter mudado
        // entre a detecção e o reparo.
        let (endpoints, stale) = {
            let Ok(graph) = self.graph.read() else {
                return RepairOutcome::Abandoned;
            };
            match graph.channel(breakage.channel_id) {
                None => (None, true),
                Some(channel) => {
                    let healed = breakage.cause == BreakageCause::FidelityCollapse
                        && channel.fidelity() >= self.config.fail_threshold;
                    (Some(channel.endpoints()), healed)
                }
            }
        };
        if stale {
            return RepairOutcome::Healed;
        }
        let Some((a_id, b_id)) = endpoints else {
            return RepairOutcome::Healed;
        };

        // Ciclo de reparo: substituto + uma passada de estabilização.
        let replaced: Option<ChannelId> = {
            let Ok(mut graph) = self.graph.write() else {
                return RepairOutcome::Abandoned;
            };
            let (Some(a), Some(b)) = (graph.node(a_id).cloned(), graph.node(b_id).cloned()) else {
                // Endpoint sumiu: remove e abandona. Handlers podem
                // ler o grafo; emitir só depois de soltar o lock.
                let _ = graph.remove_channel(breakage.channel_id);
                drop(graph);
                let _ = self.events.emit(NetEvent::ChannelRemoved {
                    channel: breakage.channel_id,
                });
                return RepairOutcome::Abandoned;
            };
            let new_id = ChannelId(graph.max_channel_id() + 1);
            match self
                .distributor
                .replacement_channel(new_id, &a, &b, attempt)
                .and_then(|new| {
                    graph
                        .replace_channel(breakage.channel_id, new)
                        .map_err(Into::into)
                }) {
                Ok(()) => Some(new_id),
                Err(_) => None,
            }
        };
        let Some(new_id) = replaced else {
            return self.abandon(breakage.channel_id);
        };

        // Uma passada de stabilize em direção ao warn threshold.
        let _ = self.monitor.stabilize(self.config.warn_threshold);

        let Ok(graph) = self.graph.read() else {
            return RepairOutcome::Abandoned;
        };
        let fidelity = graph.channel(new_id).map(|c| c.fidelity());
        drop(graph);

        match fidelity {
            Some(f) if f >= self.config.warn_threshold => {
                let _ = self.events.emit(NetEvent::ChannelRepaired {
                    old_channel: breakage.channel_id,
                    new_channel: new_id,
                    fidelity: f,
                });
                RepairOutcome::Replaced
            }
            _ => self.abandon(new_id),
        }
    }

    /// Marca inativo, remove do grafo e registra o abandono
    fn abandon(&self, id: ChannelId) -> RepairOutcome {
        if let Ok(mut graph) = self.graph.write() {
            let _ = graph.remove_channel(id);
        }
        let _ = self.events.emit(NetEvent::ChannelRemoved { channel: id });
        RepairOutcome::Abandoned
    }
}
