//! Fachada do motor de sincronização
//!
//! `SyncEngine` é o ponto de entrada público: cria redes, sincroniza
//! estados, mantém coerência, resolve conflitos, executa algoritmos
//! distribuídos e teleporta unidades. Cada rede viva carrega o próprio
//! grafo, monitor, loop de recuperação e task em background; o motor
//! só faz o roteamento pelo registro.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use qns_core::{
    Channel, ChannelId, EventFilter, NetEvent, NetEventBus, NetworkConfig, NetworkId, NetworkNode,
    Position, StateUnit, TopologyGraph, TopologySnapshot,
};
use qns_entanglement::{
    ChannelDistributor, CoherenceMonitor, CoherenceReport, StabilizationOutcome,
    TeleportOutcome, TeleportationService,
};
use qns_sync::{AlgorithmSpec, DistributedAlgorithmExecutor, DistributedResult, StateSynchronizer, SyncReport};

use crate::breakage::{Breakage, Conflict};
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::recovery::{ConflictRecoveryLoop, RecoveryReport};
use crate::registry::NetworkRegistry;
use crate::scheduler::RecoveryTask;

/// Raio do anel onde os nós da rede são posicionados
const RING_RADIUS: f64 = 3.0;

/// Pedido de manutenção de coerência
///
/// Todo pedido carrega um deadline; `None` usa o timeout padrão da
/// configuração. Deadline estourado vira quebra de timeout para o
/// próximo ciclo de recuperação, nunca retry automático.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceRequest {
    /// Unidades a avaliar
    pub units: Vec<StateUnit>,
    /// Qualidade alvo da estabilização
    pub target_quality: f64,
    /// Deadline em ms (None = `maintenance_timeout_ms` da config)
    pub deadline_ms: Option<u64>,
}

impl CoherenceRequest {
    pub fn new(units: Vec<StateUnit>, target_quality: f64) -> Self {
        Self {
            units,
            target_quality,
            deadline_ms: None,
        }
    }

    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }
}

/// Resultado de uma passada de manutenção
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceResult {
    /// Avaliação de coerência antes da estabilização
    pub report: CoherenceReport,
    /// Passada de estabilização, se a qualidade estava abaixo do alvo
    pub stabilization: Option<StabilizationOutcome>,
    /// Deadline estourado (quebra de timeout já registrada)
    pub timed_out: bool,
    pub elapsed_ms: f64,
}

/// Rede ativa: grafo + colaboradores + task de recuperação
pub struct Network {
    id: NetworkId,
    dimensions: Vec<u32>,
    graph: Arc<RwLock<TopologyGraph>>,
    config: NetworkConfig,
    events: NetEventBus,
    monitor: CoherenceMonitor,
    synchronizer: StateSynchronizer,
    executor: DistributedAlgorithmExecutor,
    teleporter: Mutex<TeleportationService>,
    recovery: ConflictRecoveryLoop,
    task: Mutex<Option<RecoveryTask>>,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("id", &self.id)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl Network {
    fn build(
        id: NetworkId,
        dimensions: Vec<u32>,
        graph: TopologyGraph,
        config: NetworkConfig,
    ) -> Self {
        let graph = Arc::new(RwLock::new(graph));
        let events = NetEventBus::with_history(config.event_history);
        let distributor = ChannelDistributor::new(config.clone());
        let monitor = CoherenceMonitor::new(graph.clone(), config.clone(), events.clone());
        let synchronizer =
            StateSynchronizer::new(graph.clone(), monitor.clone(), events.clone());
        let executor = DistributedAlgorithmExecutor::new(graph.clone());
        let teleporter = Mutex::new(TeleportationService::new(config.clone()));
        let recovery = ConflictRecoveryLoop::new(
            graph.clone(),
            distributor,
            monitor.clone(),
            events.clone(),
            config.clone(),
        );
        Self {
            id,
            dimensions,
            graph,
            config,
            events,
            monitor,
            synchronizer,
            executor,
            teleporter,
            recovery,
            task: Mutex::new(None),
        }
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    /// Dimensões declaradas na inicialização
    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }

    /// Ids de nó em ordem
    pub fn node_ids(&self) -> OrchestrationResult<Vec<qns_core::NodeId>> {
        let graph = self.graph.read()?;
        Ok(graph.nodes().iter().map(|n| n.id).collect())
    }

    /// Visão read-only da topologia
    pub fn snapshot(&self) -> OrchestrationResult<TopologySnapshot> {
        let graph = self.graph.read()?;
        Ok(graph.snapshot())
    }

    /// Dispara a task periódica de recuperação
    fn start_recovery(&self) -> OrchestrationResult<()> {
        let mut task = self.task.lock()?;
        if task.as_ref().is_some_and(RecoveryTask::is_running) {
            return Err(OrchestrationError::AlreadyRunning(self.id));
        }
        let interval = Duration::from_millis(self.config.recovery_interval_ms);
        *task = Some(RecoveryTask::spawn(self.recovery.clone(), interval));
        Ok(())
    }

    /// Para e faz join na task (idempotente)
    fn stop_recovery(&self) -> OrchestrationResult<()> {
        let mut task = self.task.lock()?;
        if let Some(mut running) = task.take() {
            running.stop()?;
        }
        Ok(())
    }
}

/// Motor de sincronização de rede
///
/// Uma instância por processo; cada rede registrada roda a própria
/// task de recuperação até o teardown.
#[derive(Debug)]
pub struct SyncEngine {
    config: NetworkConfig,
    registry: NetworkRegistry,
    next_id: AtomicU64,
}

impl SyncEngine {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            registry: NetworkRegistry::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Redes vivas, em ordem de id
    pub fn network_ids(&self) -> OrchestrationResult<Vec<NetworkId>> {
        self.registry.ids()
    }

    /// Cria uma rede com um nó por dimensão, totalmente conectada
    ///
    /// Os nós entram num anel de raio fixo em ordem de dimensão, com
    /// capacidade `max(dim, 1)`. A distribuição cria um canal por par;
    /// menos de dois nós deixa o grafo sem canais.
    pub fn initialize_network(&self, dimensions: &[u32]) -> OrchestrationResult<NetworkId> {
        if dimensions.is_empty() {
            return Err(OrchestrationError::EmptyDimensions);
        }

        let count = dimensions.len();
        let nodes: Vec<NetworkNode> = dimensions
            .iter()
            .enumerate()
            .map(|(i, &dim)| {
                let angle = std::f64::consts::TAU * (i as f64) / (count as f64);
                NetworkNode::new(
                    (i + 1) as u64,
                    Position::new(RING_RADIUS * angle.cos(), RING_RADIUS * angle.sin(), 0.0),
                    dim.max(1),
                )
            })
            .collect();

        let distributor = ChannelDistributor::new(self.config.clone());
        let channels = distributor.distribute(&nodes)?;

        let mut graph = TopologyGraph::new();
        for node in &nodes {
            graph.add_node(node.clone())?;
        }
        let created: Vec<(ChannelId, f64)> =
            channels.iter().map(|c| (c.id, c.fidelity())).collect();
        for channel in channels {
            graph.add_channel(channel)?;
        }

        let id = NetworkId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let network = Arc::new(Network::build(
            id,
            dimensions.to_vec(),
            graph,
            self.config.clone(),
        ));
        for (channel, fidelity) in created {
            let _ = network
                .events
                .emit(NetEvent::ChannelCreated { channel, fidelity });
        }
        network.start_recovery()?;
        self.registry.insert(network)?;
        Ok(id)
    }

    /// Reconcilia um lote de unidades de estado
    ///
    /// Erros estruturais (lote/dimensões vazios) sobem; falha por
    /// unidade fica no relatório.
    pub fn synchronize_states(
        &self,
        id: NetworkId,
        states: &[StateUnit],
        dimensions: &[u32],
    ) -> OrchestrationResult<SyncReport> {
        let network = self.registry.get(id)?;
        Ok(network.synchronizer.synchronize(states, dimensions)?)
    }

    /// Uma passada de avaliação + estabilização sob deadline
    pub fn maintain_coherence(
        &self,
        id: NetworkId,
        request: &CoherenceRequest,
    ) -> OrchestrationResult<MaintenanceResult> {
        let network = self.registry.get(id)?;
        let deadline_ms = request
            .deadline_ms
            .unwrap_or(network.config.maintenance_timeout_ms);
        let started = Instant::now();

        let report = network.monitor.assess(&request.units)?;
        let stabilization = if report.overall_quality < request.target_quality {
            Some(network.monitor.stabilize(request.target_quality)?)
        } else {
            None
        };

        let elapsed = started.elapsed();
        let timed_out = elapsed > Duration::from_millis(deadline_ms);
        if timed_out {
            let _ = network.events.emit(NetEvent::MaintenanceTimeout {
                elapsed_ms: elapsed.as_millis() as u64,
            });
            // O canal mais fraco vira quebra de timeout; o próximo
            // ciclo de recuperação faz uma tentativa limitada.
            if let Some(weakest) = self.weakest_channel(&network)? {
                network.recovery.report_breakage(Breakage::timeout(weakest));
            }
        }

        Ok(MaintenanceResult {
            report,
            stabilization,
            timed_out,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        })
    }

    /// Registra uma medição externa de fidelidade de canal
    ///
    /// Fidelidade abaixo do fail threshold desativa o canal; o loop
    /// de recuperação o apanha no próximo ciclo.
    pub fn report_fidelity(
        &self,
        id: NetworkId,
        channel_id: ChannelId,
        fidelity: f64,
    ) -> OrchestrationResult<()> {
        let network = self.registry.get(id)?;
        {
            let mut graph = network.graph.write()?;
            graph.update_fidelity(channel_id, fidelity, network.config.fail_threshold)?;
        }
        if fidelity < network.config.fail_threshold {
            let _ = network.events.emit(NetEvent::ChannelBroken {
                channel: channel_id,
                fidelity,
            });
        } else if fidelity < network.config.warn_threshold {
            let _ = network.events.emit(NetEvent::ChannelDegraded {
                channel: channel_id,
                fidelity,
            });
        }
        Ok(())
    }

    fn weakest_channel(&self, network: &Network) -> OrchestrationResult<Option<ChannelId>> {
        let graph = network.graph.read()?;
        Ok(graph
            .channels()
            .iter()
            .min_by(|a, b| a.fidelity().total_cmp(&b.fidelity()))
            .map(|c| c.id))
    }

    /// Um ciclo de recuperação sobre conflitos fornecidos pelo chamador
    ///
    /// O trabalho de reparo cobre os conflitos fornecidos, as quebras
    /// pendentes (timeouts) e a varredura de detecção, com uma
    /// tentativa de reparo por canal. O relatório presta contas
    /// conflito a conflito: `resolved + unresolved == conflicts.len()`.
    /// Desfecho parcial sempre: cada conflito resolve ou não,
    /// independentemente dos demais.
    pub fn resolve_conflicts(
        &self,
        id: NetworkId,
        conflicts: Vec<Conflict>,
    ) -> OrchestrationResult<RecoveryReport> {
        let network = self.registry.get(id)?;
        Ok(network.recovery.resolve(conflicts))
    }

    /// Executa um algoritmo distribuído sobre todos os nós da rede
    pub fn execute_algorithm(
        &self,
        id: NetworkId,
        spec: &AlgorithmSpec,
    ) -> OrchestrationResult<DistributedResult> {
        let network = self.registry.get(id)?;
        let nodes = network.node_ids()?;
        Ok(network.executor.execute(spec, &nodes))
    }

    /// Teleporta uma unidade através de um canal específico
    ///
    /// O canal é revalidado sob o read lock na hora da chamada; canal
    /// inativo ou desconhecido é erro de precondição.
    pub fn teleport(
        &self,
        id: NetworkId,
        unit: &StateUnit,
        channel_id: ChannelId,
    ) -> OrchestrationResult<TeleportOutcome> {
        let network = self.registry.get(id)?;
        let channel: Channel = {
            let graph = network.graph.read()?;
            graph
                .channel(channel_id)
                .cloned()
                .ok_or(qns_core::CoreError::UnknownChannel(channel_id))?
        };
        let outcome = {
            let mut teleporter = network.teleporter.lock()?;
            teleporter.teleport(unit, &channel)?
        };
        let _ = network.events.emit(NetEvent::TeleportCompleted {
            source: channel.node_a,
            target: channel.node_b,
            fidelity: outcome.result_fidelity,
            success: outcome.success,
        });
        Ok(outcome)
    }

    /// Taxa de sucesso de teleporte (None = histórico completo)
    pub fn teleport_success_rate(
        &self,
        id: NetworkId,
        window: Option<usize>,
    ) -> OrchestrationResult<f64> {
        let network = self.registry.get(id)?;
        let teleporter = network.teleporter.lock()?;
        Ok(teleporter.rolling_success_rate(window))
    }

    /// Visão read-only da topologia de uma rede
    pub fn snapshot(&self, id: NetworkId) -> OrchestrationResult<TopologySnapshot> {
        self.registry.get(id)?.snapshot()
    }

    /// Inscreve um handler nos eventos de uma rede
    pub fn subscribe<F>(
        &self,
        id: NetworkId,
        filter: EventFilter,
        handler: F,
    ) -> OrchestrationResult<()>
    where
        F: Fn(&NetEvent) + Send + Sync + 'static,
    {
        let network = self.registry.get(id)?;
        network.events.subscribe(filter, handler)?;
        Ok(())
    }

    /// Histórico de eventos de uma rede
    pub fn event_history(&self, id: NetworkId) -> OrchestrationResult<Vec<NetEvent>> {
        let network = self.registry.get(id)?;
        Ok(network.events.history()?)
    }

    /// Encerra a rede: para a task, drena leitores, descarta o grafo
    pub fn teardown(&self, id: NetworkId) -> OrchestrationResult<()> {
        let network = self.registry.remove(id)?;
        network.stop_recovery()?;
        // O write lock só entra depois que todos os leitores em voo
        // soltarem o read lock; trocar o grafo descarta nós e canais.
        let mut graph = network.graph.write()?;
        *graph = TopologyGraph::new();
        Ok(())
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Ok(ids) = self.registry.ids() {
            for id in ids {
                let _ = self.teardown(id);
            }
        }
    }
}
