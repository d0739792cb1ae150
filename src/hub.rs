//! Broadcast Hub
//!
//! Fans each tick's immutable snapshot out to every connected session. The
//! tick driver is the only sender; sessions hold broadcast receivers. A
//! receiver that falls behind the channel depth lags and skips the missed
//! ticks — no backlog is replayed on its behalf.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::defaults::BROADCAST_CHANNEL_CAPACITY;
use crate::types::FleetSnapshot;

/// Cheaply cloneable handle to the fan-out channel.
#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<Arc<FleetSnapshot>>,
    clients: Arc<AtomicUsize>,
}

/// Decrements the connected-client count when a session ends, however it
/// ends.
pub struct ClientGuard {
    clients: Arc<AtomicUsize>,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.clients.fetch_sub(1, Ordering::Relaxed);
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CHANNEL_CAPACITY);
        Self {
            tx,
            clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish one tick's snapshot to all subscribers.
    ///
    /// A send error only means no session is connected right now; that is
    /// normal, not a fault.
    pub fn publish(&self, snapshot: Arc<FleetSnapshot>) {
        let _ = self.tx.send(snapshot);
    }

    /// Subscribe a new session. The guard keeps the client count accurate
    /// for the lifetime of the session.
    pub fn subscribe(&self) -> (broadcast::Receiver<Arc<FleetSnapshot>>, ClientGuard) {
        self.clients.fetch_add(1, Ordering::Relaxed);
        (
            self.tx.subscribe(),
            ClientGuard {
                clients: Arc::clone(&self.clients),
            },
        )
    }

    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
