//! # 🔄 qns-sync — Sincronização Distribuída
//!
//! Reconcilia lotes de unidades de estado através da rede e executa
//! sequências de operações multi-nó sobre a topologia de canais.
//!
//! Duas políticas de falha distintas, de propósito:
//!
//! | Componente | Política |
//! |---|---|
//! | `StateSynchronizer` | falha parcial: unidade falha, lote continua |
//! | `DistributedAlgorithmExecutor` | fail-fast: passos são causalmente dependentes |
//!
//! ## Exemplo
//!
//! ```ignore
//! use qns_sync::StateSynchronizer;
//!
//! let result = synchronizer.synchronize(&units, &[0, 1, 2])?;
//! assert_eq!(result.synchronized_ids.len() + result.failed_ids.len(), units.len());
//! ```

pub mod error;
pub mod executor;
pub mod synchronizer;

pub use error::{SyncError, SyncResult};
pub use executor::{
    AlgorithmOp, AlgorithmSpec, CommunicationPattern, DistributedAlgorithmExecutor,
    DistributedResult,
};
pub use synchronizer::{StateSynchronizer, SyncReport};
