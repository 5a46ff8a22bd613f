use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use corsia_domain::{AuditEntry, AuditSink};

/// Asynchronous, best-effort recorder of booking attempts.
///
/// Entries are handed to a worker task over a bounded channel, so the
/// reservation path never waits on the sink. Sink failures are logged and
/// swallowed; a full buffer drops the entry rather than blocking or growing
/// without bound.
pub struct AuditRecorder {
    tx: mpsc::Sender<AuditEntry>,
    worker: JoinHandle<()>,
}

impl AuditRecorder {
    pub fn start(sink: Arc<dyn AuditSink>, buffer: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(buffer);

        let worker = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(e) = sink.publish(&entry).await {
                    error!("Failed to publish audit entry {}: {}", entry.id, e);
                }
            }
        });

        Self { tx, worker }
    }

    /// Non-blocking hand-off. Never affects the booking outcome.
    pub fn record(&self, entry: AuditEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                warn!(
                    "Audit buffer full, dropping entry for flight {}",
                    entry.flight_id
                );
            }
            Err(TrySendError::Closed(entry)) => {
                warn!(
                    "Audit recorder stopped, dropping entry for flight {}",
                    entry.flight_id
                );
            }
        }
    }

    /// Close the channel and wait for buffered entries to drain.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!("Audit worker terminated abnormally: {}", e);
        }
    }
}
