//! Classificação de quebras de canal
//!
//! Uma quebra é um canal com fidelidade abaixo do fail threshold, um
//! deadline de manutenção estourado ou um endpoint inalcançável. A
//! severidade é ordenada (`Low < Medium < High < Critical`) e dirige a
//! ordem de processamento do loop de recuperação.

use serde::{Deserialize, Serialize};

use qns_core::{timestamp_ms, ChannelId, NetworkConfig};

/// Severidade de uma quebra, em ordem crescente
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Severity {
    /// Degradação transitória (abaixo do warn threshold)
    #[default]
    Low,
    /// Deadline de manutenção estourado
    Medium,
    /// Fidelidade abaixo do fail threshold
    High,
    /// Colapso (abaixo de metade do fail threshold) ou endpoint perdido
    Critical,
}

/// Causa de uma quebra
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakageCause {
    /// Fidelidade caiu abaixo do threshold
    FidelityCollapse,
    /// Chamada de manutenção estourou o deadline
    Timeout,
    /// Endpoint não existe mais no grafo
    EndpointUnreachable,
}

/// Quebra detectada num canal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakage {
    pub channel_id: ChannelId,
    pub cause: BreakageCause,
    pub severity: Severity,
    /// Timestamp da detecção (ms); desempata a ordem de processamento
    pub detected_at: u64,
}

/// Conflito reportado por um chamador externo (mesma forma da quebra)
pub type Conflict = Breakage;

impl Breakage {
    /// Quebra por colapso de fidelidade, severidade derivada do valor
    ///
    /// Fidelidade saudável (≥ warn threshold) não é quebra: `None`.
    pub fn from_fidelity(
        channel_id: ChannelId,
        fidelity: f64,
        config: &NetworkConfig,
    ) -> Option<Self> {
        let severity = if fidelity < config.fail_threshold / 2.0 {
            Severity::Critical
        } else if fidelity < config.fail_threshold {
            Severity::High
        } else if fidelity < config.warn_threshold {
            Severity::Low
        } else {
            return None;
        };
        Some(Self {
            channel_id,
            cause: BreakageCause::FidelityCollapse,
            severity,
            detected_at: timestamp_ms(),
        })
    }

    /// Quebra por timeout de manutenção
    pub fn timeout(channel_id: ChannelId) -> Self {
        Self {
            channel_id,
            cause: BreakageCause::Timeout,
            severity: Severity::Medium,
            detected_at: timestamp_ms(),
        }
    }

    /// Quebra por endpoint inalcançável
    pub fn unreachable(channel_id: ChannelId) -> Self {
        Self {
            channel_id,
            cause: BreakageCause::EndpointUnreachable,
            severity: Severity::Critical,
            detected_at: timestamp_ms(),
        }
    }
}

/// Ordena quebras: severidade decrescente, detecção mais antiga primeiro
pub fn sort_for_processing(breakages: &mut [Breakage]) {
    breakages.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(a.detected_at.cmp(&b.detected_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_severity_from_fidelity() {
        let config = NetworkConfig::default(); // fail = 0.6, warn = 0.85
        assert_eq!(
            Breakage::from_fidelity(ChannelId(1), 0.1, &config).unwrap().severity,
            Severity::Critical
        );
        assert_eq!(
            Breakage::from_fidelity(ChannelId(1), 0.4, &config).unwrap().severity,
            Severity::High
        );
        assert_eq!(
            Breakage::from_fidelity(ChannelId(1), 0.7, &config).unwrap().severity,
            Severity::Low
        );
    }

    #[test]
    fn test_healthy_fidelity_is_not_a_breakage() {
        let config = NetworkConfig::default();
        assert!(Breakage::from_fidelity(ChannelId(1), 0.85, &config).is_none());
        assert!(Breakage::from_fidelity(ChannelId(1), 0.99, &config).is_none());
    }

    #[test]
    fn test_processing_order() {
        let mut breakages = vec![
            Breakage {
                channel_id: ChannelId(1),
                cause: BreakageCause::FidelityCollapse,
                severity: Severity::High,
                detected_at: 20,
            },
            Breakage {
                channel_id: ChannelId(2),
                cause: BreakageCause::Timeout,
                severity: Severity::Medium,
                detected_at: 5,
            },
            Breakage {
                channel_id: ChannelId(3),
                cause: BreakageCause::FidelityCollapse,
                severity: Severity::High,
                detected_at: 10,
            },
            Breakage {
                channel_id: ChannelId(4),
                cause: BreakageCause::EndpointUnreachable,
                severity: Severity::Critical,
                detected_at: 99,
            },
        ];
        sort_for_processing(&mut breakages);
        let order: Vec<u64> = breakages.iter().map(|b| b.channel_id.0).collect();
        // Critical primeiro; empate em High resolvido pela detecção
        assert_eq!(order, vec![4, 3, 1, 2]);
    }
}
