//! # 🎭 qns-orchestration — Motor de Sincronização
//!
//! Fachada do motor: registro de redes, loop de recuperação de
//! conflitos com task periódica em background, e os seis pontos de
//! entrada públicos sobre as camadas de emaranhamento e sincronização.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SyncEngine                            │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │            NetworkRegistry                            │  │
//! │  │  NetworkId → Network (grafo + colaboradores + task)   │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │            ConflictRecoveryLoop                       │  │
//! │  │  detect → classify → sort → one repair each          │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │            RecoveryTask (thread + shutdown channel)   │  │
//! │  │  tick a cada recovery_interval_ms até o teardown     │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use qns_orchestration::SyncEngine;
//! use qns_core::NetworkConfig;
//!
//! let engine = SyncEngine::new(NetworkConfig::default());
//! let id = engine.initialize_network(&[2, 2, 3])?;
//! let report = engine.synchronize_states(id, &units, &[2, 3])?;
//! engine.teardown(id)?;
//! ```

pub mod breakage;
pub mod engine;
pub mod error;
pub mod recovery;
pub mod registry;
pub mod scheduler;

pub use breakage::{Breakage, BreakageCause, Conflict, Severity};
pub use engine::{CoherenceRequest, MaintenanceResult, Network, SyncEngine};
pub use error::{OrchestrationError, OrchestrationResult};
pub use recovery::{ConflictRecoveryLoop, RecoveryReport};
pub use registry::NetworkRegistry;
pub use scheduler::RecoveryTask;

#[cfg(test)]
mod tests;
