//! Tipos de erro do núcleo

use thiserror::Error;

use crate::{ChannelId, NodeId};

/// Resultado customizado para operações do núcleo
pub type CoreResult<T> = Result<T, CoreError>;

/// Erros estruturais do grafo de topologia
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoreError {
    /// Nó já registrado com este ID
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Nó referenciado não existe
    #[error("Unknown node id: {0}")]
    UnknownNode(NodeId),

    /// Canal já registrado com este ID
    #[error("Duplicate channel id: {0}")]
    DuplicateChannel(ChannelId),

    /// Canal referenciado não existe
    #[error("Unknown channel id: {0}")]
    UnknownChannel(ChannelId),

    /// Canal ligando um nó a si mesmo
    #[error("Channel endpoints must be distinct: {0}")]
    SelfLink(NodeId),

    /// Fidelidade fora de [0, 1]
    #[error("Fidelity out of range: {0}")]
    FidelityOutOfRange(f64),

    /// Lock poison
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        CoreError::LockPoisoned(err.to_string())
    }
}
