//! Executor de algoritmos distribuídos
//!
//! Executa uma sequência de operações multi-nó sobre o subconjunto de
//! canais implicado pelo padrão de comunicação. Operações rodam na
//! ordem dada (ordem causal); qualquer falha de handler para a
//! execução imediatamente — ao contrário do sincronizador, os passos
//! aqui dependem uns dos outros, então não há falha parcial por passo.
//!
//! O overhead de comunicação deriva do padrão e do número de medições
//! e trocas de emaranhamento (2 bits clássicos por link por operação),
//! não da contagem total de operações.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use qns_core::{ChannelId, NodeId, TopologyGraph};

/// Bits clássicos trocados por link em medições e swaps
const CLASSICAL_BITS_PER_LINK: u64 = 2;

/// Operação de um algoritmo distribuído (conjunto fechado e tipado)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlgorithmOp {
    /// Computação local num nó
    LocalCompute { node: NodeId, cost: f64 },
    /// Troca de pareamento entre dois canais
    EntanglementSwap { left: ChannelId, right: ChannelId },
    /// Medição: produz bits clássicos (entra no overhead)
    Measurement { node: NodeId },
    /// Preparação de estado num nó
    StatePrep { node: NodeId, dimension: u32 },
}

impl AlgorithmOp {
    /// Operação contribui para o overhead de comunicação?
    pub fn is_communicating(&self) -> bool {
        matches!(
            self,
            AlgorithmOp::Measurement { .. } | AlgorithmOp::EntanglementSwap { .. }
        )
    }
}

/// Padrão de comunicação: subconjunto da topologia usado na execução
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum CommunicationPattern {
    /// Todos contra todos: n(n−1)/2 links
    #[default]
    AllToAll,
    /// Anel: n links (2 nós degeneram num link)
    Ring,
    /// Estrela em torno de um hub: n−1 links
    Star { hub: NodeId },
    /// Árvore binária implícita na ordem dos nós: n−1 links
    Tree,
    /// Mapa de adjacência explícito
    Custom(HashMap<NodeId, Vec<NodeId>>),
}

impl CommunicationPattern {
    /// Links implicados pelo padrão sobre o conjunto de nós
    pub fn links(&self, nodes: &[NodeId]) -> Vec<(NodeId, NodeId)> {
        let mut sorted: Vec<NodeId> = nodes.to_vec();
        sorted.sort();
        sorted.dedup();
        let n = sorted.len();
        if n < 2 {
            return Vec::new();
        }

        let canonical = |a: NodeId, b: NodeId| if a <= b { (a, b) } else { (b, a) };
        let mut links = match self {
            CommunicationPattern::AllToAll => {
                let mut links = Vec::with_capacity(n * (n - 1) / 2);
                for i in 0..n {
                    for j in (i + 1)..n {
                        links.push((sorted[i], sorted[j]));
                    }
                }
                links
            }
            CommunicationPattern::Ring => {
                let mut links: Vec<(NodeId, NodeId)> = (0..n)
                    .map(|i| canonical(sorted[i], sorted[(i + 1) % n]))
                    .collect();
                links.dedup();
                links
            }
            CommunicationPattern::Star { hub } => sorted
                .iter()
                .filter(|&&node| node != *hub)
                .map(|&node| canonical(*hub, node))
                .collect(),
            CommunicationPattern::Tree => (1..n)
                .map(|i| canonical(sorted[(i - 1) / 2], sorted[i]))
                .collect(),
            CommunicationPattern::Custom(map) => {
                let mut links = Vec::new();
                for (&a, targets) in map {
                    for &b in targets {
                        if a != b {
                            links.push(canonical(a, b));
                        }
                    }
                }
                links
            }
        };
        links.sort();
        links.dedup();
        links
    }
}

/// Especificação de um algoritmo distribuído
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSpec {
    /// Operações em ordem causal
    pub operations: Vec<AlgorithmOp>,
    /// Padrão de comunicação
    pub pattern: CommunicationPattern,
}

impl AlgorithmSpec {
    pub fn new(operations: Vec<AlgorithmOp>, pattern: CommunicationPattern) -> Self {
        Self {
            operations,
            pattern,
        }
    }
}

/// Resultado de uma execução distribuída
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributedResult {
    /// Execução completou todos os passos?
    pub success: bool,
    /// Estados de saída por nó (parciais em caso de falha)
    pub node_outputs: HashMap<NodeId, f64>,
    /// Bits clássicos trocados (padrão × medições/swaps)
    pub communication_overhead: u64,
    /// Operações concluídas antes de parar
    pub completed_ops: usize,
    /// Tempo de execução (ms)
    pub execution_time_ms: f64,
    /// Causa da parada, se houve
    pub error: Option<String>,
}

/// Executa sequências de operações sobre os canais da topologia
#[derive(Debug, Clone)]
pub struct DistributedAlgorithmExecutor {
    graph: Arc<RwLock<TopologyGraph>>,
}

impl DistributedAlgorithmExecutor {
    /// Cria executor sobre o grafo compartilhado
    pub fn new(graph: Arc<RwLock<TopologyGraph>>) -> Self {
        Self { graph }
    }

    fn fail(
        started: Instant,
        node_outputs: HashMap<NodeId, f64>,
        overhead: u64,
        completed: usize,
        message: String,
    ) -> DistributedResult {
        DistributedResult {
            success: false,
            node_outputs,
            communication_overhead: overhead,
            completed_ops: completed,
            execution_time_ms: started.elapsed().as_secs_f64() * 1_000.0,
            error: Some(message),
        }
    }

    /// Executa a especificação sobre o conjunto de nós participantes
    pub fn execute(&self, spec: &AlgorithmSpec, nodes: &[NodeId]) -> DistributedResult {
        let started = Instant::now();
        let links = spec.pattern.links(nodes);
        let link_count = links.len() as u64;

        let mut node_outputs: HashMap<NodeId, f64> = HashMap::new();
        let mut communicating_ops = 0u64;

        for (index, op) in spec.operations.iter().enumerate() {
            let overhead = link_count * communicating_ops * CLASSICAL_BITS_PER_LINK;
            let result = self.apply(op, nodes, &mut node_outputs);
            if let Err(message) = result {
                return Self::fail(started, node_outputs, overhead, index, message);
            }
            if op.is_communicating() {
                communicating_ops += 1;
            }
        }

        DistributedResult {
            success: true,
            node_outputs,
            communication_overhead: link_count * communicating_ops * CLASSICAL_BITS_PER_LINK,
            completed_ops: spec.operations.len(),
            execution_time_ms: started.elapsed().as_secs_f64() * 1_000.0,
            error: None,
        }
    }

    /// Handler de uma operação; `Err` para a execução
    fn apply(
        &self,
        op: &AlgorithmOp,
        nodes: &[NodeId],
        outputs: &mut HashMap<NodeId, f64>,
    ) -> Result<(), String> {
        match op {
            AlgorithmOp::LocalCompute { node, cost } => {
                if !nodes.contains(node) {
                    return Err(format!("local compute on non-participating {node}"));
                }
                if !cost.is_finite() || *cost < 0.0 {
                    return Err(format!("invalid compute cost {cost}"));
                }
                *outputs.entry(*node).or_insert(0.0) += cost;
                Ok(())
            }
            AlgorithmOp::EntanglementSwap { left, right } => {
                if left == right {
                    return Err(format!("swap requires two distinct channels, got {left}"));
                }
                // Revalidação imediatamente antes do uso: o loop de
                // recuperação pode ter mexido nos canais.
                let mut graph = self.graph.write().map_err(|e| e.to_string())?;
                let (f_left, f_right) = {
                    let l = graph
                        .channel(*left)
                        .ok_or_else(|| format!("unknown channel {left}"))?;
                    let r = graph
                        .channel(*right)
                        .ok_or_else(|| format!("unknown channel {right}"))?;
                    if !l.is_active() {
                        return Err(format!("channel {left} inactive"));
                    }
                    if !r.is_active() {
                        return Err(format!("channel {right} inactive"));
                    }
                    (l.fidelity(), r.fidelity())
                };
                // Troca de pareamento: as qualidades dos dois canais
                // trocam de lugar na matriz.
                let fail = 0.0; // ativo antes ⇒ ativo depois, sem rebaixar
                graph
                    .update_fidelity(*left, f_right, fail)
                    .map_err(|e| e.to_string())?;
                graph
                    .update_fidelity(*right, f_left, fail)
                    .map_err(|e| e.to_string())?;
                Ok(())
            }
            AlgorithmOp::Measurement { node } => {
                if !nodes.contains(node) {
                    return Err(format!("measurement on non-participating {node}"));
                }
                let graph = self.graph.read().map_err(|e| e.to_string())?;
                let best = graph
                    .neighbors(*node)
                    .into_iter()
                    .filter_map(|id| graph.channel(id))
                    .filter(|c| c.is_active())
                    .map(|c| c.fidelity())
                    .fold(0.0f64, f64::max);
                outputs.insert(*node, best);
                Ok(())
            }
            AlgorithmOp::StatePrep { node, dimension } => {
                if !nodes.contains(node) {
                    return Err(format!("state prep on non-participating {node}"));
                }
                // Estado preparado parte de uma linha de base por dimensão
                outputs.insert(*node, 1.0 / (1.0 + f64::from(*dimension)));
                Ok(())
            }
        }
    }
}
