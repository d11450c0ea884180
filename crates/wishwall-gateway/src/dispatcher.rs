use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::broadcast;
use uuid::Uuid;

use wishwall_types::api::WishResponse;
use wishwall_types::events::GatewayEvent;

/// A freshly inserted wish plus the owner of its wall, so each connection
/// can decide whether its viewer may see the content.
#[derive(Debug, Clone)]
pub struct WallBroadcast {
    pub owner_id: Uuid,
    pub wish: WishResponse,
}

impl WallBroadcast {
    pub fn wall_id(&self) -> Uuid {
        self.wish.wall_id
    }

    /// Full wish for the wall owner, redacted for everyone else.
    pub fn event_for(&self, viewer: Option<Uuid>) -> GatewayEvent {
        let wish = if viewer == Some(self.owner_id) {
            self.wish.clone()
        } else {
            self.wish.clone().redacted()
        };
        GatewayEvent::WishCreate { wish }
    }
}

/// Manages all connected clients and broadcasts inserts.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Every connection receives every insert and filters by subscription
    broadcast_tx: broadcast::Sender<WallBroadcast>,

    connections: AtomicUsize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                connections: AtomicUsize::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WallBroadcast> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an insert to all connected clients. Having no listeners is
    /// not an error.
    pub fn broadcast(&self, owner_id: Uuid, wish: WishResponse) {
        let _ = self.inner.broadcast_tx.send(WallBroadcast { owner_id, wish });
    }

    /// Count a connection for as long as the returned guard lives.
    pub fn track_connection(&self) -> ConnectionGuard {
        self.inner.connections.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard {
            dispatcher: self.clone(),
        }
    }

    pub fn connections(&self) -> usize {
        self.inner.connections.load(Ordering::Relaxed)
    }
}

pub struct ConnectionGuard {
    dispatcher: Dispatcher,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.dispatcher.inner.connections.fetch_sub(1, Ordering::Relaxed);
    }
}
