//! Canais emaranhados entre pares de nós
//!
//! Um canal liga exatamente dois nós distintos e carrega fidelidade em
//! [0, 1]. O invariante `active ⇔ fidelity ≥ fail_threshold` é mantido
//! pelos mutadores, nunca ajustado à mão.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::node::NodeId;

/// ID único de um canal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// Link com qualidade entre dois nós
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// ID do canal
    pub id: ChannelId,
    /// Primeiro endpoint
    pub node_a: NodeId,
    /// Segundo endpoint
    pub node_b: NodeId,
    /// Qualidade do link em [0, 1]
    fidelity: f64,
    /// Latência estimada (ms)
    pub latency_ms: f64,
    /// Largura de banda (unidades de estado por segundo)
    pub bandwidth: f64,
    /// Ativo ⇔ fidelity ≥ fail_threshold
    active: bool,
}

impl Channel {
    /// Cria canal novo, ativo conforme o threshold de falha
    pub fn new(
        id: u64,
        node_a: NodeId,
        node_b: NodeId,
        fidelity: f64,
        latency_ms: f64,
        bandwidth: f64,
        fail_threshold: f64,
    ) -> CoreResult<Self> {
        if node_a == node_b {
            return Err(CoreError::SelfLink(node_a));
        }
        if !(0.0..=1.0).contains(&fidelity) {
            return Err(CoreError::FidelityOutOfRange(fidelity));
        }
        Ok(Self {
            id: ChannelId(id),
            node_a,
            node_b,
            fidelity,
            latency_ms,
            bandwidth,
            active: fidelity >= fail_threshold,
        })
    }

    /// Fidelidade atual
    pub fn fidelity(&self) -> f64 {
        self.fidelity
    }

    /// Canal está ativo?
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Atualiza fidelidade mantendo o invariante de ativação
    pub fn set_fidelity(&mut self, fidelity: f64, fail_threshold: f64) -> CoreResult<()> {
        if !(0.0..=1.0).contains(&fidelity) {
            return Err(CoreError::FidelityOutOfRange(fidelity));
        }
        self.fidelity = fidelity;
        self.active = fidelity >= fail_threshold;
        Ok(())
    }

    /// Marca o canal como inativo (quebra confirmada)
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Par de endpoints em ordem canônica (menor primeiro)
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        if self.node_a <= self.node_b {
            (self.node_a, self.node_b)
        } else {
            (self.node_b, self.node_a)
        }
    }

    /// Verifica se o canal toca o nó
    pub fn touches(&self, node: NodeId) -> bool {
        self.node_a == node || self.node_b == node
    }
}
