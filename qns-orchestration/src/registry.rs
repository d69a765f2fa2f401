//! Registro de redes ativas
//!
//! Guarda as redes vivas do motor indexadas por id. Substitui uma
//! lista global: cada `SyncEngine` carrega o próprio registro e o
//! teardown remove a entrada explicitamente.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use qns_core::NetworkId;

use crate::engine::Network;
use crate::error::{OrchestrationError, OrchestrationResult};

/// Registro de redes por id
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: Arc<Mutex<HashMap<NetworkId, Arc<Network>>>>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere a rede; id repetido substitui a entrada anterior
    pub fn insert(&self, network: Arc<Network>) -> OrchestrationResult<()> {
        let mut networks = self.networks.lock()?;
        networks.insert(network.id(), network);
        Ok(())
    }

    /// Busca uma rede pelo id
    pub fn get(&self, id: NetworkId) -> OrchestrationResult<Arc<Network>> {
        let networks = self.networks.lock()?;
        networks
            .get(&id)
            .cloned()
            .ok_or(OrchestrationError::NetworkNotFound(id))
    }

    /// Remove e devolve a rede
    pub fn remove(&self, id: NetworkId) -> OrchestrationResult<Arc<Network>> {
        let mut networks = self.networks.lock()?;
        networks
            .remove(&id)
            .ok_or(OrchestrationError::NetworkNotFound(id))
    }

    /// Ids das redes vivas, ordenados
    pub fn ids(&self) -> OrchestrationResult<Vec<NetworkId>> {
        let networks = self.networks.lock()?;
        let mut ids: Vec<NetworkId> = networks.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn len(&self) -> usize {
        self.networks.lock().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
