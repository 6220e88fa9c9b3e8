//! Registry of connected channel clients and fan-out of outbound messages.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Transport a client is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// Bidirectional channel; may send admin actions.
    WebSocket,
    /// Read-only event stream.
    Sse,
}

/// Serialized payload queued for one client.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// Message `type`, reused as the SSE event name.
    pub event: &'static str,
    /// JSON body of the message.
    pub data: Arc<str>,
}

impl ServerEvent {
    /// Serialize `payload` once so it can be shared by every recipient.
    pub fn json<T>(event: &'static str, payload: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            event,
            data: serde_json::to_string(payload)?.into(),
        })
    }
}

#[derive(Clone)]
struct ClientConnection {
    kind: ClientKind,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Set of open client channels keyed by a per-connection identifier.
#[derive(Default)]
pub struct ClientHub {
    clients: DashMap<Uuid, ClientConnection>,
}

impl ClientHub {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and return its identifier with the receiving end of its queue.
    pub fn register(&self, kind: ClientKind) -> (Uuid, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.clients.insert(id, ClientConnection { kind, tx });
        (id, rx)
    }

    /// Forget a client; unknown ids are ignored.
    pub fn unregister(&self, id: &Uuid) {
        self.clients.remove(id);
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Queue `event` for every open client and prune the ones found closed.
    ///
    /// Never blocks: each client drains its own unbounded queue. Returns the
    /// number of clients the event was queued for.
    pub fn broadcast(&self, event: ServerEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in self.clients.iter() {
            if entry.tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push((*entry.key(), entry.kind));
            }
        }

        for (id, kind) in closed {
            debug!(client = %id, ?kind, "pruning closed client");
            self.clients.remove(&id);
        }

        delivered
    }

    /// Queue `event` for a single client. Returns `false` when it is gone.
    pub fn send_to(&self, id: &Uuid, event: ServerEvent) -> bool {
        let Some(connection) = self.clients.get(id) else {
            return false;
        };
        let tx = connection.tx.clone();
        drop(connection);

        if tx.send(event).is_ok() {
            true
        } else {
            warn!(client = %id, "client queue closed; removing");
            self.clients.remove(id);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(data: &str) -> ServerEvent {
        ServerEvent {
            event: "timer_tick",
            data: data.into(),
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_every_open_client() {
        let hub = ClientHub::new();
        let (_a, mut rx_a) = hub.register(ClientKind::WebSocket);
        let (_b, mut rx_b) = hub.register(ClientKind::Sse);

        assert_eq!(hub.broadcast(event("1")), 2);
        assert_eq!(&*rx_a.recv().await.unwrap().data, "1");
        assert_eq!(&*rx_b.recv().await.unwrap().data, "1");
    }

    #[tokio::test]
    async fn closed_clients_are_skipped_and_pruned() {
        let hub = ClientHub::new();
        let (_open, mut rx_open) = hub.register(ClientKind::WebSocket);
        let (_gone, rx_gone) = hub.register(ClientKind::WebSocket);
        drop(rx_gone);

        assert_eq!(hub.broadcast(event("x")), 1);
        assert_eq!(hub.len(), 1);
        assert_eq!(&*rx_open.recv().await.unwrap().data, "x");
    }

    #[tokio::test]
    async fn send_to_targets_one_client() {
        let hub = ClientHub::new();
        let (a, mut rx_a) = hub.register(ClientKind::WebSocket);
        let (_b, mut rx_b) = hub.register(ClientKind::WebSocket);

        assert!(hub.send_to(&a, event("only-a")));
        assert_eq!(&*rx_a.recv().await.unwrap().data, "only-a");
        assert!(rx_b.try_recv().is_err());

        hub.unregister(&a);
        assert!(!hub.send_to(&a, event("again")));
    }
}
