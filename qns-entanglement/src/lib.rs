//! # 🔗 qns-entanglement — Canais Emaranhados e Coerência
//!
//! Constrói o conjunto de canais sobre um conjunto de nós, mantém a
//! qualidade (fidelidade) dos canais coerente ao longo do tempo e
//! implementa o protocolo de teleporte ponto-a-ponto com taxa de
//! sucesso rolante.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │         ChannelDistributor                      │
//! │  grafo completo + fidelidade por distância      │
//! │  (ruído limitado, seed explícita)               │
//! ├─────────────────────────────────────────────────┤
//! │         CoherenceMonitor                        │
//! │  Coherent → Degraded → Decoherent → Recovering  │
//! │  assess / stabilize                             │
//! ├─────────────────────────────────────────────────┤
//! │         TeleportationService                    │
//! │  2 bits clássicos + histórico append-only       │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use qns_entanglement::ChannelDistributor;
//! use qns_core::NetworkConfig;
//!
//! let distributor = ChannelDistributor::new(NetworkConfig::default());
//! let channels = distributor.distribute(&nodes)?;
//! ```

pub mod coherence;
pub mod distributor;
pub mod error;
pub mod teleport;

pub use coherence::{CoherenceMonitor, CoherencePhase, CoherenceReport, StabilizationOutcome};
pub use distributor::ChannelDistributor;
pub use error::{EntanglementError, EntanglementResult};
pub use teleport::{TeleportEvent, TeleportOutcome, TeleportationService};
