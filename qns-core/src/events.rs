//! Bus de eventos estruturados da rede
//!
//! Todo desfecho de recuperação, degradação ou teleporte vira um
//! evento tipado entregue a handlers inscritos, com histórico
//! limitado. Nenhum componente escreve direto no console.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;
use crate::error::CoreResult;
use crate::node::NodeId;

/// Handler de eventos (callback)
pub type NetEventHandler = Arc<dyn Fn(&NetEvent) + Send + Sync>;

/// Evento estruturado da rede
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetEvent {
    /// Canal criado pela distribuição
    ChannelCreated {
        channel: ChannelId,
        fidelity: f64,
    },
    /// Fidelidade abaixo do warn threshold
    ChannelDegraded {
        channel: ChannelId,
        fidelity: f64,
    },
    /// Fidelidade abaixo do fail threshold
    ChannelBroken {
        channel: ChannelId,
        fidelity: f64,
    },
    /// Canal substituído com sucesso pelo loop de recuperação
    ChannelRepaired {
        old_channel: ChannelId,
        new_channel: ChannelId,
        fidelity: f64,
    },
    /// Canal removido (recuperação abandonada)
    ChannelRemoved {
        channel: ChannelId,
    },
    /// Lote de sincronização concluído
    SyncCompleted {
        synchronized: usize,
        failed: usize,
        avg_fidelity: f64,
    },
    /// Teleporte concluído
    TeleportCompleted {
        source: NodeId,
        target: NodeId,
        fidelity: f64,
        success: bool,
    },
    /// Ciclo de recuperação concluído
    RecoveryCycle {
        resolved: usize,
        unresolved: usize,
        reestablished: usize,
    },
    /// Deadline de manutenção estourado (vira quebra, nunca retry)
    MaintenanceTimeout {
        elapsed_ms: u64,
    },
    /// Erro de componente
    Error {
        component: String,
        message: String,
        recoverable: bool,
    },
}

/// Filtro de eventos
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Todos os eventos
    All,
    /// Eventos de um canal específico
    Channel(ChannelId),
    /// Degradações e quebras
    Degradation,
    /// Reparos, remoções e ciclos de recuperação
    Recovery,
    /// Eventos de erro
    Error,
    /// Erros de um componente específico
    Source(String),
}

impl EventFilter {
    /// Verifica se um evento passa pelo filtro
    pub fn matches(&self, event: &NetEvent) -> bool {
        match (self, event) {
            (EventFilter::All, _) => true,
            (EventFilter::Channel(id), NetEvent::ChannelCreated { channel, .. })
            | (EventFilter::Channel(id), NetEvent::ChannelDegraded { channel, .. })
            | (EventFilter::Channel(id), NetEvent::ChannelBroken { channel, .. })
            | (EventFilter::Channel(id), NetEvent::ChannelRemoved { channel }) => id == channel,
            (EventFilter::Channel(id), NetEvent::ChannelRepaired { old_channel, new_channel, .. }) => {
                id == old_channel || id == new_channel
            }
            (EventFilter::Degradation, NetEvent::ChannelDegraded { .. })
            | (EventFilter::Degradation, NetEvent::ChannelBroken { .. }) => true,
            (EventFilter::Recovery, NetEvent::ChannelRepaired { .. })
            | (EventFilter::Recovery, NetEvent::ChannelRemoved { .. })
            | (EventFilter::Recovery, NetEvent::RecoveryCycle { .. })
            | (EventFilter::Recovery, NetEvent::MaintenanceTimeout { .. }) => true,
            (EventFilter::Error, NetEvent::Error { .. }) => true,
            (EventFilter::Source(src), NetEvent::Error { component, .. }) => component == src,
            _ => false,
        }
    }
}

/// Bus de eventos da rede
#[derive(Clone)]
pub struct NetEventBus {
    handlers: Arc<Mutex<HashMap<EventFilter, Vec<NetEventHandler>>>>,
    history: Arc<Mutex<Vec<NetEvent>>>,
    max_history: usize,
}

impl NetEventBus {
    /// Cria bus com histórico padrão
    pub fn new() -> Self {
        Self::with_history(256)
    }

    /// Cria com tamanho de histórico customizado
    pub fn with_history(max_history: usize) -> Self {
        Self {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            history: Arc::new(Mutex::new(Vec::new())),
            max_history,
        }
    }

    /// Registra handler para um filtro
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> CoreResult<()>
    where
        F: Fn(&NetEvent) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.lock()?;
        handlers.entry(filter).or_default().push(Arc::new(handler));
        Ok(())
    }

    /// Remove todos os handlers de um filtro
    pub fn unsubscribe(&self, filter: &EventFilter) -> CoreResult<()> {
        let mut handlers = self.handlers.lock()?;
        handlers.remove(filter);
        Ok(())
    }

    /// Emite um evento
    pub fn emit(&self, event: NetEvent) -> CoreResult<()> {
        {
            let mut history = self.history.lock()?;
            history.push(event.clone());
            if history.len() > self.max_history {
                history.remove(0);
            }
        }

        let handlers = self.handlers.lock()?;
        for (filter, handler_list) in handlers.iter() {
            if filter.matches(&event) {
                for handler in handler_list {
                    handler(&event);
                }
            }
        }
        Ok(())
    }

    /// Retorna histórico de eventos
    pub fn history(&self) -> CoreResult<Vec<NetEvent>> {
        let history = self.history.lock()?;
        Ok(history.clone())
    }

    /// Limpa histórico
    pub fn clear_history(&self) -> CoreResult<()> {
        let mut history = self.history.lock()?;
        history.clear();
        Ok(())
    }

    /// Conta handlers registrados
    pub fn handler_count(&self) -> CoreResult<usize> {
        let handlers = self.handlers.lock()?;
        Ok(handlers.values().map(|v| v.len()).sum())
    }
}

impl Default for NetEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NetEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetEventBus")
            .field("max_history", &self.max_history)
            .field(
                "history_len",
                &self.history.lock().map(|h| h.len()).unwrap_or(0),
            )
            .finish()
    }
}
