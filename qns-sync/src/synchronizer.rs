//! Sincronizador de unidades de estado
//!
//! Reconcilia um lote de unidades sobre o conjunto de dimensões.
//! Cada unidade é processada de forma independente: um passo limitado
//! de execução (custo em operações + tempo), revalidação do canal
//! imediatamente antes do uso e uma avaliação de coerência. A falha de
//! uma unidade não aborta o lote — entra em `failed_ids`. Apenas erros
//! estruturais (lote vazio, dimensões vazias) abortam a chamada.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use qns_core::{NetEvent, NetEventBus, StateUnit, TopologyGraph};
use qns_entanglement::CoherenceMonitor;

use crate::error::{SyncError, SyncResult};

/// Operações contabilizadas por unidade por dimensão
const OPS_PER_UNIT_DIMENSION: u64 = 3;

/// Resultado agregado de um lote de sincronização
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Unidades reconciliadas com sucesso
    pub synchronized_ids: Vec<u64>,
    /// Unidades que falharam (disjunto de `synchronized_ids`)
    pub failed_ids: Vec<u64>,
    /// Fidelidade média dos canais no momento da chamada
    pub avg_fidelity: f64,
    /// Total de operações contabilizadas
    pub ops_count: u64,
    /// Tempo decorrido (ms)
    pub elapsed_ms: f64,
}

/// Reconcilia unidades de estado através da rede
#[derive(Debug, Clone)]
pub struct StateSynchronizer {
    graph: Arc<RwLock<TopologyGraph>>,
    monitor: CoherenceMonitor,
    events: NetEventBus,
}

impl StateSynchronizer {
    /// Cria sincronizador sobre o grafo e monitor compartilhados
    pub fn new(
        graph: Arc<RwLock<TopologyGraph>>,
        monitor: CoherenceMonitor,
        events: NetEventBus,
    ) -> Self {
        Self {
            graph,
            monitor,
            events,
        }
    }

    /// Passo limitado de execução de uma unidade
    ///
    /// Revalida o canal escolhido imediatamente antes do uso: o grafo
    /// pode ter mudado entre a leitura e o uso (loop de recuperação em
    /// background). Canal obsoleto/inativo falha só esta unidade.
    fn execute_unit(&self, unit: &StateUnit, dimensions: &[u32]) -> SyncResult<bool> {
        let graph = self.graph.read().map_err(qns_core::CoreError::from)?;
        if graph.channel_count() == 0 {
            return Ok(false);
        }
        // Escolha determinística do canal da unidade
        let channels = graph.channels();
        let channel = channels[(unit.id() as usize) % channels.len()];
        let active = channel.is_active();
        let fail_threshold = self.monitor.config().fail_threshold;
        drop(graph);

        if !active {
            return Ok(false);
        }

        // Dimensão da unidade precisa estar no conjunto pedido
        if !dimensions.contains(&unit.dimension()) {
            return Ok(false);
        }

        let report = self.monitor.assess(std::slice::from_ref(unit))?;
        Ok(report.overall_quality >= fail_threshold)
    }

    /// Reconcilia o lote de unidades
    pub fn synchronize(
        &self,
        states: &[StateUnit],
        dimensions: &[u32],
    ) -> SyncResult<SyncReport> {
        if states.is_empty() {
            return Err(SyncError::EmptyStateBatch);
        }
        if dimensions.is_empty() {
            return Err(SyncError::EmptyDimensionSet);
        }

        let started = Instant::now();
        let avg_fidelity = {
            let graph = self.graph.read().map_err(qns_core::CoreError::from)?;
            graph.average_fidelity()
        };

        let mut synchronized_ids = Vec::new();
        let mut failed_ids = Vec::new();
        let mut ops_count = 0u64;

        for unit in states {
            ops_count += dimensions.len() as u64 * OPS_PER_UNIT_DIMENSION;
            match self.execute_unit(unit, dimensions) {
                Ok(true) => synchronized_ids.push(unit.id()),
                Ok(false) => failed_ids.push(unit.id()),
                // Erro não-estrutural durante uma unidade falha só ela
                Err(SyncError::Core(_)) | Err(SyncError::Entanglement(_)) => {
                    failed_ids.push(unit.id());
                }
                Err(structural) => return Err(structural),
            }
        }

        let report = SyncReport {
            synchronized_ids,
            failed_ids,
            avg_fidelity,
            ops_count,
            elapsed_ms: started.elapsed().as_secs_f64() * 1_000.0,
        };

        let _ = self.events.emit(NetEvent::SyncCompleted {
            synchronized: report.synchronized_ids.len(),
            failed: report.failed_ids.len(),
            avg_fidelity,
        });

        Ok(report)
    }
}
