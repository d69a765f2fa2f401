//! Configuração da rede
//!
//! Todos os thresholds, o modelo de ruído semeado e a cadência de
//! manutenção vivem aqui. Nenhum componente usa aleatoriedade sem
//! seed explícita.

use serde::{Deserialize, Serialize};

/// Seed padrão do modelo de ruído ("QLNS")
pub const DEFAULT_SEED: u64 = 0x514C_4E53;

/// Configuração de uma rede QNS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Abaixo disto o canal é quebra (inativo, candidato a recuperação)
    pub fail_threshold: f64,
    /// Abaixo disto o canal é degradação transitória
    pub warn_threshold: f64,
    /// Fidelidade mínima para um teleporte bem-sucedido
    pub teleport_success_threshold: f64,
    /// Fator de ruído multiplicativo do protocolo de teleporte
    pub teleport_noise_factor: f64,
    /// Comprimento de decaimento do modelo de fidelidade por distância
    pub decay_length: f64,
    /// Amplitude máxima do ruído uniforme sobre a fidelidade inicial
    pub noise_amplitude: f64,
    /// Seed do gerador (determinismo por par de nós)
    pub seed: u64,
    /// Intervalo do loop de recuperação (ms)
    pub recovery_interval_ms: u64,
    /// Deadline de uma chamada de manutenção (ms)
    pub maintenance_timeout_ms: u64,
    /// Passo máximo de uma chamada de stabilize
    pub max_stabilize_step: f64,
    /// Custo contabilizado por canal tocado no stabilize
    pub stabilize_unit_cost: f64,
    /// Tempo de coerência de referência para pesos do assess (ms)
    pub reference_coherence_ms: u64,
    /// Tamanho do histórico do bus de eventos
    pub event_history: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fail_threshold: 0.6,
            warn_threshold: 0.85,
            teleport_success_threshold: 0.8,
            teleport_noise_factor: 0.95,
            decay_length: 120.0,
            noise_amplitude: 0.02,
            seed: DEFAULT_SEED,
            recovery_interval_ms: 250,
            maintenance_timeout_ms: 2_000,
            max_stabilize_step: 0.1,
            stabilize_unit_cost: 0.01,
            reference_coherence_ms: 1_000,
            event_history: 256,
        }
    }
}

impl NetworkConfig {
    /// Define a seed do modelo de ruído
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Define thresholds de falha e alerta
    pub fn with_thresholds(mut self, fail: f64, warn: f64) -> Self {
        self.fail_threshold = fail;
        self.warn_threshold = warn;
        self
    }

    /// Define intervalo do loop de recuperação
    pub fn with_recovery_interval_ms(mut self, interval: u64) -> Self {
        self.recovery_interval_ms = interval;
        self
    }

    /// Define deadline de manutenção
    pub fn with_maintenance_timeout_ms(mut self, timeout: u64) -> Self {
        self.maintenance_timeout_ms = timeout;
        self
    }

    /// Desliga o ruído (testes de monotonicidade)
    pub fn without_noise(mut self) -> Self {
        self.noise_amplitude = 0.0;
        self
    }
}
