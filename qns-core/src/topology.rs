//! Grafo de topologia com matriz de qualidade derivada
//!
//! Registro de nós e canais de uma rede. A matriz de qualidade é
//! simétrica por construção: cada canal tem exatamente uma entrada,
//! indexada pelo par não-ordenado de endpoints em ordem canônica.
//! A diagonal não existe (self-links são rejeitados na criação).
//!
//! Todas as mutações passam pelo write lock da rede dona deste grafo
//! (disciplina single-writer, ver qns-orchestration).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelId};
use crate::error::{CoreError, CoreResult};
use crate::node::{NetworkNode, NodeId};

/// Grafo de nós e canais com matriz de qualidade
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    nodes: HashMap<NodeId, NetworkNode>,
    channels: HashMap<ChannelId, Channel>,
    /// Entrada única por par canônico (a < b); simetria por construção
    matrix: HashMap<(NodeId, NodeId), f64>,
}

impl TopologyGraph {
    /// Cria grafo vazio
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona nó; falha se o ID já existir
    pub fn add_node(&mut self, node: NetworkNode) -> CoreResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(CoreError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Adiciona canal; falha se algum endpoint não existir
    pub fn add_channel(&mut self, channel: Channel) -> CoreResult<()> {
        if self.channels.contains_key(&channel.id) {
            return Err(CoreError::DuplicateChannel(channel.id));
        }
        if !self.nodes.contains_key(&channel.node_a) {
            return Err(CoreError::UnknownNode(channel.node_a));
        }
        if !self.nodes.contains_key(&channel.node_b) {
            return Err(CoreError::UnknownNode(channel.node_b));
        }
        self.matrix.insert(channel.endpoints(), channel.fidelity());
        self.channels.insert(channel.id, channel);
        Ok(())
    }

    /// Remove canal e sua entrada na matriz
    pub fn remove_channel(&mut self, id: ChannelId) -> CoreResult<Channel> {
        let channel = self
            .channels
            .remove(&id)
            .ok_or(CoreError::UnknownChannel(id))?;
        self.matrix.remove(&channel.endpoints());
        Ok(channel)
    }

    /// Substitui um canal in-place (mesmo par de endpoints, canal novo)
    ///
    /// Usado pelo loop de recuperação: o canal quebrado sai, o
    /// substituto entra, a matriz é atualizada numa operação só.
    pub fn replace_channel(&mut self, old_id: ChannelId, new: Channel) -> CoreResult<()> {
        let old = self
            .channels
            .get(&old_id)
            .ok_or(CoreError::UnknownChannel(old_id))?;
        if old.endpoints() != new.endpoints() {
            return Err(CoreError::UnknownChannel(new.id));
        }
        self.channels.remove(&old_id);
        self.matrix.insert(new.endpoints(), new.fidelity());
        self.channels.insert(new.id, new);
        Ok(())
    }

    /// Atualiza fidelidade de um canal, refletindo na matriz
    pub fn update_fidelity(
        &mut self,
        id: ChannelId,
        fidelity: f64,
        fail_threshold: f64,
    ) -> CoreResult<()> {
        let channel = self
            .channels
            .get_mut(&id)
            .ok_or(CoreError::UnknownChannel(id))?;
        channel.set_fidelity(fidelity, fail_threshold)?;
        self.matrix.insert(channel.endpoints(), fidelity);
        Ok(())
    }

    /// Canais que tocam o nó
    pub fn neighbors(&self, node: NodeId) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self
            .channels
            .values()
            .filter(|ch| ch.touches(node))
            .map(|ch| ch.id)
            .collect();
        ids.sort();
        ids
    }

    /// Entrada da matriz de qualidade; `None` é o sentinela "sem link"
    pub fn fidelity(&self, a: NodeId, b: NodeId) -> Option<f64> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.matrix.get(&key).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&NetworkNode> {
        self.nodes.get(&id)
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    /// Todos os nós (ordem de ID)
    pub fn nodes(&self) -> Vec<&NetworkNode> {
        let mut nodes: Vec<&NetworkNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    /// Todos os canais (ordem de ID)
    pub fn channels(&self) -> Vec<&Channel> {
        let mut channels: Vec<&Channel> = self.channels.values().collect();
        channels.sort_by_key(|c| c.id);
        channels
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Fidelidade média sobre todos os canais (0.0 se não houver)
    pub fn average_fidelity(&self) -> f64 {
        if self.channels.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.channels.values().map(|c| c.fidelity()).sum();
        sum / self.channels.len() as f64
    }

    /// Maior ID de canal em uso (alocação de substitutos)
    pub fn max_channel_id(&self) -> u64 {
        self.channels.keys().map(|c| c.0).max().unwrap_or(0)
    }

    /// Snapshot read-only para a camada de relatórios
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            nodes: self.nodes().into_iter().cloned().collect(),
            channels: self.channels().into_iter().cloned().collect(),
            average_fidelity: self.average_fidelity(),
            taken_at: crate::timestamp_ms(),
        }
    }
}

/// Visão imutável do grafo num instante
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NetworkNode>,
    pub channels: Vec<Channel>,
    pub average_fidelity: f64,
    pub taken_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Position;

    fn node(id: u64, x: f64) -> NetworkNode {
        NetworkNode::new(id, Position::new(x, 0.0, 0.0), 4)
    }

    fn channel(id: u64, a: u64, b: u64, fidelity: f64) -> Channel {
        Channel::new(id, NodeId(a), NodeId(b), fidelity, 1.0, 100.0, 0.6).unwrap()
    }

    fn graph_with_nodes(n: u64) -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        for i in 1..=n {
            graph.add_node(node(i, i as f64)).unwrap();
        }
        graph
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = graph_with_nodes(1);
        let err = graph.add_node(node(1, 9.0));
        assert!(matches!(err, Err(CoreError::DuplicateNode(_))));
    }

    #[test]
    fn test_channel_requires_known_nodes() {
        let mut graph = graph_with_nodes(2);
        let err = graph.add_channel(channel(1, 1, 9, 0.9));
        assert!(matches!(err, Err(CoreError::UnknownNode(NodeId(9)))));
    }

    #[test]
    fn test_matrix_symmetric() {
        let mut graph = graph_with_nodes(2);
        graph.add_channel(channel(1, 2, 1, 0.9)).unwrap();
        assert_eq!(graph.fidelity(NodeId(1), NodeId(2)), Some(0.9));
        assert_eq!(graph.fidelity(NodeId(2), NodeId(1)), Some(0.9));
    }

    #[test]
    fn test_no_link_sentinel() {
        let graph = graph_with_nodes(2);
        assert_eq!(graph.fidelity(NodeId(1), NodeId(2)), None);
    }

    #[test]
    fn test_remove_channel_clears_matrix() {
        let mut graph = graph_with_nodes(2);
        graph.add_channel(channel(1, 1, 2, 0.9)).unwrap();
        graph.remove_channel(ChannelId(1)).unwrap();
        assert_eq!(graph.fidelity(NodeId(1), NodeId(2)), None);
        assert_eq!(graph.channel_count(), 0);
    }

    #[test]
    fn test_update_fidelity_reflects_in_matrix() {
        let mut graph = graph_with_nodes(2);
        graph.add_channel(channel(1, 1, 2, 0.9)).unwrap();
        graph.update_fidelity(ChannelId(1), 0.4, 0.6).unwrap();
        assert_eq!(graph.fidelity(NodeId(1), NodeId(2)), Some(0.4));
        assert!(!graph.channel(ChannelId(1)).unwrap().is_active());
    }

    #[test]
    fn test_replace_channel_same_endpoints() {
        let mut graph = graph_with_nodes(2);
        graph.add_channel(channel(1, 1, 2, 0.3)).unwrap();
        graph.replace_channel(ChannelId(1), channel(2, 1, 2, 0.95)).unwrap();
        assert_eq!(graph.channel_count(), 1);
        assert_eq!(graph.fidelity(NodeId(1), NodeId(2)), Some(0.95));
        assert!(graph.channel(ChannelId(1)).is_none());
    }

    #[test]
    fn test_replace_channel_endpoint_mismatch() {
        let mut graph = graph_with_nodes(3);
        graph.add_channel(channel(1, 1, 2, 0.3)).unwrap();
        let err = graph.replace_channel(ChannelId(1), channel(2, 1, 3, 0.95));
        assert!(err.is_err());
    }

    #[test]
    fn test_neighbors() {
        let mut graph = graph_with_nodes(3);
        graph.add_channel(channel(1, 1, 2, 0.9)).unwrap();
        graph.add_channel(channel(2, 1, 3, 0.9)).unwrap();
        graph.add_channel(channel(3, 2, 3, 0.9)).unwrap();

        assert_eq!(graph.neighbors(NodeId(1)), vec![ChannelId(1), ChannelId(2)]);
        assert_eq!(graph.neighbors(NodeId(3)), vec![ChannelId(2), ChannelId(3)]);
    }

    #[test]
    fn test_average_fidelity() {
        let mut graph = graph_with_nodes(3);
        assert_eq!(graph.average_fidelity(), 0.0);
        graph.add_channel(channel(1, 1, 2, 0.8)).unwrap();
        graph.add_channel(channel(2, 1, 3, 0.6)).unwrap();
        assert!((graph.average_fidelity() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut graph = graph_with_nodes(2);
        graph.add_channel(channel(1, 1, 2, 0.9)).unwrap();
        let snap = graph.snapshot();
        graph.remove_channel(ChannelId(1)).unwrap();
        assert_eq!(snap.channels.len(), 1);
        assert_eq!(graph.channel_count(), 0);
    }
}
