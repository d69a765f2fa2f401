//! Tipos de erro para qns-sync

use thiserror::Error;

use qns_core::{CoreError, NodeId};
use qns_entanglement::EntanglementError;

/// Resultado customizado para operações de sincronização
pub type SyncResult<T> = Result<T, SyncError>;

/// Erros estruturais de sincronização (abortam a chamada inteira)
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// Lote de estados vazio nunca vira sucesso de comprimento zero
    #[error("Empty state batch")]
    EmptyStateBatch,

    #[error("Empty dimension set")]
    EmptyDimensionSet,

    #[error("Unknown node in spec: {0}")]
    UnknownNode(NodeId),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Entanglement error: {0}")]
    Entanglement(#[from] EntanglementError),
}
