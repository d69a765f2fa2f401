//! Unidades de estado distribuídas
//!
//! Unidades são fornecidas pelo chamador e imutáveis após a criação;
//! são descartadas quando a chamada retorna.

use serde::{Deserialize, Serialize};

/// Unidade de estado a ser reconciliada pela rede
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUnit {
    id: u64,
    dimension: u32,
    coherence_time_ms: u64,
    phase: f64,
}

impl StateUnit {
    /// Cria nova unidade de estado
    pub fn new(id: u64, dimension: u32, coherence_time_ms: u64, phase: f64) -> Self {
        Self {
            id,
            dimension,
            coherence_time_ms,
            phase,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Janela de coerência esperada (ms)
    pub fn coherence_time_ms(&self) -> u64 {
        self.coherence_time_ms
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }
}
