//! # 🕸️ qns-core — Núcleo da Rede de Sincronização Emaranhada
//!
//! Tipos de domínio da rede QNS: nós, canais com fidelidade, grafo de
//! topologia com matriz de qualidade derivada, unidades de estado e o
//! bus de eventos estruturados.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │         TopologyGraph                           │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  Nodes + Channels Registry                │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  Quality Matrix (simétrica)               │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  NetEventBus (sink estruturado)           │  │
//! │  └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use qns_core::{TopologyGraph, NetworkNode, Position, NetworkConfig};
//!
//! let mut graph = TopologyGraph::new();
//! graph.add_node(NetworkNode::new(1, Position::new(0.0, 0.0, 0.0), 4))?;
//! graph.add_node(NetworkNode::new(2, Position::new(3.0, 4.0, 0.0), 4))?;
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod node;
pub mod state;
pub mod topology;

pub use channel::{Channel, ChannelId};
pub use config::NetworkConfig;
pub use error::{CoreError, CoreResult};
pub use events::{EventFilter, NetEvent, NetEventBus};
pub use node::{NetworkNode, NodeId, Position};
pub use state::StateUnit;
pub use topology::{TopologyGraph, TopologySnapshot};

/// ID de uma rede ativa no registry
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct NetworkId(pub u64);

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "net-{:08x}", self.0)
    }
}

/// Timestamp em milissegundos desde UNIX_EPOCH
pub fn timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
