//! Erros de orquestração

use thiserror::Error;

use qns_core::{CoreError, NetworkId};
use qns_entanglement::EntanglementError;
use qns_sync::SyncError;

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Erros de orquestração
#[derive(Debug, Clone, Error)]
pub enum OrchestrationError {
    /// Rede não registrada
    #[error("Network not found: {0}")]
    NetworkNotFound(NetworkId),

    /// Inicialização sem dimensões
    #[error("Empty dimension set for network initialization")]
    EmptyDimensions,

    /// Task de recuperação já rodando
    #[error("Recovery task already running for {0}")]
    AlreadyRunning(NetworkId),

    /// Erro do núcleo
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Erro de emaranhamento
    #[error("Entanglement error: {0}")]
    Entanglement(#[from] EntanglementError),

    /// Erro de sincronização
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Lock poison
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for OrchestrationError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        OrchestrationError::LockPoisoned(err.to_string())
    }
}
