//! Protocolo de teleporte ponto-a-ponto
//!
//! Transfere uma unidade de estado através de um canal específico:
//!
//! 1. Pré-condição: o canal está ativo (nunca sucesso silencioso de
//!    baixa fidelidade).
//! 2. A medição produz 2 bits clássicos de correlação.
//! 3. `result_fidelity = channel.fidelity × teleport_noise_factor`.
//! 4. Sucesso ⇔ `result_fidelity ≥ teleport_success_threshold`.
//!
//! Cada teleporte entra num histórico append-only; limitar o
//! crescimento do histórico é responsabilidade do chamador.

use serde::{Deserialize, Serialize};

use qns_core::{timestamp_ms, Channel, NetworkConfig, NodeId, StateUnit};

use crate::error::{EntanglementError, EntanglementResult};

/// Registro de um teleporte no histórico
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleportEvent {
    pub source_node: NodeId,
    pub target_node: NodeId,
    pub fidelity: f64,
    pub success: bool,
    pub timestamp: u64,
}

/// Resultado de um teleporte
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeleportOutcome {
    /// Bits clássicos de correlação da medição
    pub correlation_bits: (bool, bool),
    /// Fidelidade resultante após o ruído do protocolo
    pub result_fidelity: f64,
    pub success: bool,
}

/// Serviço de teleporte com histórico e taxa de sucesso rolante
#[derive(Debug, Clone, Default)]
pub struct TeleportationService {
    config: NetworkConfig,
    history: Vec<TeleportEvent>,
}

impl TeleportationService {
    /// Cria serviço com a configuração da rede
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            history: Vec::new(),
        }
    }

    /// Teleporta uma unidade através de um canal
    pub fn teleport(
        &mut self,
        unit: &StateUnit,
        channel: &Channel,
    ) -> EntanglementResult<TeleportOutcome> {
        if !channel.is_active() {
            return Err(EntanglementError::ChannelInactive(channel.id));
        }

        // Medição de Bell simplificada: os 2 bits clássicos saem de um
        // xor-fold determinístico da unidade e do canal.
        let fold = unit.id() ^ channel.id.0 ^ unit.phase().to_bits();
        let correlation_bits = (fold & 1 == 1, (fold >> 1) & 1 == 1);

        let result_fidelity = channel.fidelity() * self.config.teleport_noise_factor;
        let success = result_fidelity >= self.config.teleport_success_threshold;

        self.history.push(TeleportEvent {
            source_node: channel.node_a,
            target_node: channel.node_b,
            fidelity: result_fidelity,
            success,
            timestamp: timestamp_ms(),
        });

        Ok(TeleportOutcome {
            correlation_bits,
            result_fidelity,
            success,
        })
    }

    /// Taxa de sucesso sobre o histórico
    ///
    /// Política fixa: `None` cobre o histórico completo; `Some(n)`
    /// cobre os `n` eventos mais recentes. Janela vazia retorna 0.0.
    pub fn rolling_success_rate(&self, window: Option<usize>) -> f64 {
        let events: &[TeleportEvent] = match window {
            Some(n) => {
                let start = self.history.len().saturating_sub(n);
                &self.history[start..]
            }
            None => &self.history,
        };
        if events.is_empty() {
            return 0.0;
        }
        let successes = events.iter().filter(|e| e.success).count();
        successes as f64 / events.len() as f64
    }

    /// Histórico completo (append-only)
    pub fn history(&self) -> &[TeleportEvent] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
