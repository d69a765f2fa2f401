//! Tipos de erro para qns-entanglement

use thiserror::Error;

use qns_core::{ChannelId, CoreError};

/// Resultado customizado para operações de emaranhamento
pub type EntanglementResult<T> = Result<T, EntanglementError>;

/// Erros que podem ocorrer em operações de emaranhamento
#[derive(Debug, Clone, Error)]
pub enum EntanglementError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Pré-condição do teleporte: canal precisa estar ativo
    #[error("Channel inactive: {0}")]
    ChannelInactive(ChannelId),

    #[error("Invalid stabilization target: {0}")]
    InvalidTarget(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_display() {
        let err = EntanglementError::ChannelInactive(ChannelId(3));
        assert!(err.to_string().contains("inactive"));
    }

    #[test]
    fn test_core_conversion() {
        let core = CoreError::UnknownChannel(ChannelId(1));
        let err: EntanglementError = core.into();
        assert!(err.to_string().contains("Core error"));
    }
}
