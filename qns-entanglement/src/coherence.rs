//! Monitor de coerência
//!
//! Máquina de fases por canal/unidade:
//!
//! ```text
//! Coherent → Degraded → Decoherent → Recovering → {Coherent | Decoherent}
//! ```
//!
//! As três primeiras fases derivam da fidelidade contra os thresholds;
//! `Recovering` é fixada enquanto o loop de recuperação é dono do
//! canal, e resolvida de volta para `Coherent` ou `Decoherent` no fim
//! do ciclo.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use qns_core::{
    ChannelId, EventFilter, NetEvent, NetEventBus, NetworkConfig, StateUnit, TopologyGraph,
};

use crate::error::{EntanglementError, EntanglementResult};

/// Fase de coerência de um canal ou unidade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CoherencePhase {
    /// Fidelidade ≥ warn threshold
    #[default]
    Coherent,
    /// Entre fail e warn — degradação transitória
    Degraded,
    /// Abaixo do fail threshold
    Decoherent,
    /// Sob reparo pelo loop de recuperação
    Recovering,
}

impl CoherencePhase {
    /// Fase derivada da fidelidade
    pub fn from_fidelity(fidelity: f64, config: &NetworkConfig) -> Self {
        if fidelity >= config.warn_threshold {
            Self::Coherent
        } else if fidelity >= config.fail_threshold {
            Self::Degraded
        } else {
            Self::Decoherent
        }
    }
}

/// Resultado de uma avaliação de coerência
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoherenceReport {
    /// Qualidade geral ponderada em [0, 1]
    pub overall_quality: f64,
    /// `1 − média ponderada de qualidade`
    pub decoherence_risk: f64,
    /// Qualidade média por dimensão
    pub by_dimension: HashMap<u32, f64>,
    /// Recomendações de manutenção
    pub recommendations: Vec<String>,
}

/// Resultado de uma passada de estabilização
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilizationOutcome {
    /// Alguma fidelidade subiu?
    pub quality_improved: bool,
    /// Risco pós-passada ficou abaixo do fail threshold?
    pub prevented_decoherence: bool,
    /// Custo contabilizado (proporcional aos canais tocados)
    pub cost: f64,
    /// Canais tocados nesta passada
    pub touched: usize,
}

/// Monitor que avalia e estabiliza a qualidade da rede
#[derive(Debug, Clone)]
pub struct CoherenceMonitor {
    graph: Arc<RwLock<TopologyGraph>>,
    config: NetworkConfig,
    events: NetEventBus,
    /// Canais atualmente em reparo (fase fixada em Recovering)
    recovering: Arc<Mutex<HashSet<ChannelId>>>,
}

impl CoherenceMonitor {
    /// Cria monitor sobre o grafo compartilhado da rede
    pub fn new(graph: Arc<RwLock<TopologyGraph>>, config: NetworkConfig, events: NetEventBus) -> Self {
        Self {
            graph,
            config,
            events,
            recovering: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Fator de coerência de uma unidade (janela curta penaliza)
    fn coherence_factor(&self, unit: &StateUnit) -> f64 {
        let reference = self.config.reference_coherence_ms.max(1) as f64;
        (unit.coherence_time_ms() as f64 / reference).min(1.0)
    }

    /// Avalia a qualidade das unidades contra o estado atual da rede
    ///
    /// Qualidade de uma unidade = fidelidade média dos canais × fator
    /// de coerência da unidade; a média geral é ponderada pelo tempo de
    /// coerência. Com lista vazia a avaliação reduz à rede: qualidade =
    /// fidelidade média dos canais.
    pub fn assess(&self, units: &[StateUnit]) -> EntanglementResult<CoherenceReport> {
        let graph = self.graph.read().map_err(qns_core::CoreError::from)?;
        let mean_fidelity = graph.average_fidelity();
        let degraded = graph
            .channels()
            .iter()
            .filter(|c| c.fidelity() < self.config.warn_threshold)
            .count();
        let broken = graph
            .channels()
            .iter()
            .filter(|c| !c.is_active())
            .count();
        drop(graph);

        let (overall_quality, by_dimension) = if units.is_empty() {
            (mean_fidelity, HashMap::new())
        } else {
            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;
            let mut dim_sum: HashMap<u32, (f64, usize)> = HashMap::new();
            for unit in units {
                let quality = mean_fidelity * self.coherence_factor(unit);
                let weight = unit.coherence_time_ms().max(1) as f64;
                weighted_sum += quality * weight;
                weight_total += weight;
                let entry = dim_sum.entry(unit.dimension()).or_insert((0.0, 0));
                entry.0 += quality;
                entry.1 += 1;
            }
            let by_dimension = dim_sum
                .into_iter()
                .map(|(dim, (sum, count))| (dim, sum / count as f64))
                .collect();
            (weighted_sum / weight_total, by_dimension)
        };

        let decoherence_risk = 1.0 - overall_quality;
        let mut recommendations = Vec::new();
        if broken > 0 {
            recommendations.push(format!("{broken} channel(s) broken; recovery cycle pending"));
        }
        if degraded > broken {
            recommendations.push(format!(
                "stabilize toward warn threshold ({:.2})",
                self.config.warn_threshold
            ));
        }
        if decoherence_risk >= 1.0 - self.config.fail_threshold {
            recommendations.push("decoherence risk critical; reduce batch size".into());
        }

        Ok(CoherenceReport {
            overall_quality,
            decoherence_risk,
            by_dimension,
            recommendations,
        })
    }

    /// Empurra as fidelidades em direção ao alvo, um passo limitado
    ///
    /// Canais já em `target` ou acima nunca descem (não-decréscimo
    /// monotônico); nenhum canal ultrapassa o alvo numa passada.
    pub fn stabilize(&self, target: f64) -> EntanglementResult<StabilizationOutcome> {
        if !(0.0..=1.0).contains(&target) {
            return Err(EntanglementError::InvalidTarget(target));
        }

        let mut touched = 0usize;
        let mut still_degraded: Vec<(ChannelId, f64)> = Vec::new();
        let post_risk = {
            let mut graph = self.graph.write().map_err(qns_core::CoreError::from)?;
            let ids: Vec<ChannelId> = graph.channels().iter().map(|c| c.id).collect();
            for id in ids {
                let Some(channel) = graph.channel(id) else {
                    continue;
                };
                let current = channel.fidelity();
                if current >= target {
                    continue;
                }
                let next = (current + self.config.max_stabilize_step).min(target);
                graph.update_fidelity(id, next, self.config.fail_threshold)?;
                touched += 1;
                if next < self.config.warn_threshold {
                    still_degraded.push((id, next));
                }
            }
            1.0 - graph.average_fidelity()
        };
        // Handlers podem ler o grafo; emitir só depois de soltar o lock
        for (channel, fidelity) in still_degraded {
            let _ = self.events.emit(NetEvent::ChannelDegraded { channel, fidelity });
        }

        Ok(StabilizationOutcome {
            quality_improved: touched > 0,
            prevented_decoherence: post_risk < self.config.fail_threshold,
            cost: self.config.stabilize_unit_cost * touched as f64,
            touched,
        })
    }

    /// Fase atual de cada canal (Recovering fixada quando em reparo)
    pub fn phases(&self) -> EntanglementResult<HashMap<ChannelId, CoherencePhase>> {
        let graph = self.graph.read().map_err(qns_core::CoreError::from)?;
        let recovering = self.recovering.lock().map_err(qns_core::CoreError::from)?;
        let phases = graph
            .channels()
            .iter()
            .map(|c| {
                let phase = if recovering.contains(&c.id) {
                    CoherencePhase::Recovering
                } else {
                    CoherencePhase::from_fidelity(c.fidelity(), &self.config)
                };
                (c.id, phase)
            })
            .collect();
        Ok(phases)
    }

    /// Marca canal como em reparo (fase Recovering)
    pub fn mark_recovering(&self, id: ChannelId) -> EntanglementResult<()> {
        let mut recovering = self.recovering.lock().map_err(qns_core::CoreError::from)?;
        recovering.insert(id);
        Ok(())
    }

    /// Resolve a fase Recovering; a fase volta a derivar da fidelidade
    pub fn clear_recovering(&self, id: ChannelId) -> EntanglementResult<()> {
        let mut recovering = self.recovering.lock().map_err(qns_core::CoreError::from)?;
        recovering.remove(&id);
        Ok(())
    }

    /// Acesso ao bus de eventos (inscrições externas)
    pub fn events(&self) -> &NetEventBus {
        &self.events
    }

    /// Inscrição conveniente em eventos de degradação
    pub fn on_degradation<F>(&self, handler: F) -> EntanglementResult<()>
    where
        F: Fn(&NetEvent) + Send + Sync + 'static,
    {
        self.events
            .subscribe(EventFilter::Degradation, handler)
            .map_err(EntanglementError::from)
    }
}
