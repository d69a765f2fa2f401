//! Nós da rede e posição espacial
//!
//! Nós são criados na inicialização da rede e imutáveis durante sua
//! vida; reconfiguração explícita cria uma nova rede.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ID único de um nó dentro de uma rede
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Posição 3D de um nó
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Distância euclidiana até outra posição
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Participante da rede com identidade, posição e capacidade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    /// ID único dentro da rede
    pub id: NodeId,
    /// Posição espacial (entra no modelo de fidelidade por distância)
    pub position: Position,
    /// Capacidade de processamento (unidades de estado simultâneas)
    pub capacity: u32,
}

impl NetworkNode {
    /// Cria novo nó
    pub fn new(id: u64, position: Position, capacity: u32) -> Self {
        Self {
            id: NodeId(id),
            position,
            capacity,
        }
    }

    /// Distância até outro nó
    pub fn distance_to(&self, other: &NetworkNode) -> f64 {
        self.position.distance_to(&other.position)
    }
}
