//! Agendador de recuperação em background
//!
//! Uma thread dedicada roda `ConflictRecoveryLoop::run_cycle` em
//! intervalo fixo até receber o sinal de parada. O canal de shutdown
//! dobra como temporizador: `recv_timeout` acorda a thread a cada
//! intervalo ou imediatamente quando `stop` envia o sinal.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};

use crate::error::OrchestrationResult;
use crate::recovery::ConflictRecoveryLoop;

/// Tarefa de recuperação periódica
///
/// `stop` é idempotente e faz join na thread; dropar a tarefa sem
/// parar também encerra a thread.
pub struct RecoveryTask {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RecoveryTask {
    /// Dispara a thread de recuperação com o intervalo configurado
    pub fn spawn(recovery: ConflictRecoveryLoop, interval: Duration) -> Self {
        let (tx, rx) = bounded::<()>(1);
        let handle = std::thread::spawn(move || loop {
            match rx.recv_timeout(interval) {
                Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    recovery.run_cycle();
                }
            }
        });
        Self {
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    /// Sinaliza parada e espera a thread encerrar
    pub fn stop(&mut self) -> OrchestrationResult<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    /// Ainda há thread viva por trás da tarefa
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for RecoveryTask {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl std::fmt::Debug for RecoveryTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryTask")
            .field("running", &self.is_running())
            .finish()
    }
}
