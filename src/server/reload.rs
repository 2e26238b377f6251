// src/server/reload.rs

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::watch::ReloadNotifier;

/// One reload pushed to browsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    /// Monotonic per process, used as the SSE event id.
    pub seq: u64,
    /// Binding label that caused the reload.
    pub reason: String,
}

/// Fan-out of reload notifications to every connected browser.
#[derive(Debug)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
    seq: AtomicU64,
}

impl ReloadHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            seq: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Number of connected clients.
    pub fn clients(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new(16)
    }
}

impl ReloadNotifier for ReloadHub {
    fn notify_reload(&self, reason: &str) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let event = ReloadEvent {
            seq,
            reason: reason.to_string(),
        };
        match self.tx.send(event) {
            Ok(clients) => info!(seq, reason, clients, "reload notification sent"),
            Err(_) => debug!(seq, reason, "reload requested, no clients connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_numbered_reloads() {
        let hub = ReloadHub::default();
        let mut rx = hub.subscribe();
        assert_eq!(hub.clients(), 1);

        hub.notify_reload("styles");
        hub.notify_reload("reload");

        assert_eq!(rx.recv().await.unwrap(), ReloadEvent { seq: 1, reason: "styles".into() });
        assert_eq!(rx.recv().await.unwrap().seq, 2);
    }

    #[test]
    fn notifying_without_clients_is_fine() {
        let hub = ReloadHub::default();
        hub.notify_reload("styles");
        assert_eq!(hub.clients(), 0);
    }
}
