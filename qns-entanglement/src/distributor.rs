//! Distribuição de canais sobre um conjunto de nós
//!
//! Política padrão: grafo completo, um canal por par não-ordenado.
//! A fidelidade inicial é uma função determinística da distância entre
//! os nós mais um termo de ruído limitado e semeado:
//!
//! ```text
//! fidelity(a, b) = clamp(exp(-d(a,b) / decay_length) - noise, 0, 1)
//! noise ∈ [0, noise_amplitude],  semeado por (seed ^ mix(a, b))
//! ```
//!
//! O ruído de cada par depende apenas da seed e dos dois IDs, então o
//! mesmo conjunto de nós com a mesma seed reproduz o mesmo conjunto de
//! canais, em qualquer ordem de entrada.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use qns_core::{Channel, ChannelId, NetworkConfig, NetworkNode};

use crate::error::EntanglementResult;

/// Mistura dois IDs de nó num valor simétrico para a seed do par
fn mix_pair(a: u64, b: u64) -> u64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    lo.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ hi.wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

/// Construtor do conjunto de canais
#[derive(Debug, Clone)]
pub struct ChannelDistributor {
    config: NetworkConfig,
}

impl ChannelDistributor {
    /// Cria distribuidor com a configuração da rede
    pub fn new(config: NetworkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Ruído limitado do par (determinístico por seed + IDs + tentativa)
    fn pair_noise(&self, a: u64, b: u64, attempt: u64) -> f64 {
        if self.config.noise_amplitude <= 0.0 {
            return 0.0;
        }
        let seed = self.config.seed ^ mix_pair(a, b) ^ attempt.wrapping_mul(0x2545_F491_4F6C_DD1D);
        let mut rng = StdRng::seed_from_u64(seed);
        rng.gen_range(0.0..=self.config.noise_amplitude)
    }

    /// Fidelidade inicial para um par de nós (tentativa 0)
    pub fn initial_fidelity(&self, a: &NetworkNode, b: &NetworkNode) -> f64 {
        self.fidelity_for_attempt(a, b, 0)
    }

    fn fidelity_for_attempt(&self, a: &NetworkNode, b: &NetworkNode, attempt: u64) -> f64 {
        let d = a.distance_to(b);
        let base = (-d / self.config.decay_length).exp();
        (base - self.pair_noise(a.id.0, b.id.0, attempt)).clamp(0.0, 1.0)
    }

    fn build_channel(
        &self,
        id: u64,
        a: &NetworkNode,
        b: &NetworkNode,
        attempt: u64,
    ) -> EntanglementResult<Channel> {
        let d = a.distance_to(b);
        let fidelity = self.fidelity_for_attempt(a, b, attempt);
        // Latência cresce com a distância; banda limitada pelo endpoint
        // mais fraco.
        let latency_ms = 0.1 + d * 0.05;
        let bandwidth = 100.0 * f64::from(a.capacity.min(b.capacity));
        let channel = Channel::new(
            id,
            a.id,
            b.id,
            fidelity,
            latency_ms,
            bandwidth,
            self.config.fail_threshold,
        )?;
        Ok(channel)
    }

    /// Constrói o grafo completo sobre o conjunto de nós
    ///
    /// Menos de 2 nós produz um conjunto vazio, não um erro. IDs de
    /// canal são sequenciais a partir de 1, na ordem canônica dos
    /// pares (IDs de nó crescentes).
    pub fn distribute(&self, nodes: &[NetworkNode]) -> EntanglementResult<Vec<Channel>> {
        if nodes.len() < 2 {
            return Ok(Vec::new());
        }

        let mut sorted: Vec<&NetworkNode> = nodes.iter().collect();
        sorted.sort_by_key(|n| n.id);

        let mut channels = Vec::with_capacity(sorted.len() * (sorted.len() - 1) / 2);
        let mut next_id = 1u64;
        for (i, a) in sorted.iter().enumerate() {
            for b in sorted.iter().skip(i + 1) {
                channels.push(self.build_channel(next_id, a, b, 0)?);
                next_id += 1;
            }
        }
        Ok(channels)
    }

    /// Canal substituto para o mesmo par de endpoints
    ///
    /// O contador de tentativa entra na seed do ruído, então cada
    /// tentativa de reparo tira um sorteio distinto — ainda
    /// reproduzível.
    pub fn replacement_channel(
        &self,
        new_id: ChannelId,
        a: &NetworkNode,
        b: &NetworkNode,
        attempt: u64,
    ) -> EntanglementResult<Channel> {
        self.build_channel(new_id.0, a, b, attempt)
    }
}
