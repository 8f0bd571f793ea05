use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{clients::NotificationStore, models::notification::CreateAdminNotification};

/// An event pushed to every live admin connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: Value,
}

impl BroadcastEvent {
    pub fn new(kind: impl Into<String>, message: Value) -> Self {
        Self {
            kind: kind.into(),
            message,
        }
    }
}

/// Registry of live admin connections.
///
/// Created once at service start and passed by reference to whatever needs
/// to broadcast; connections register on upgrade and are removed when their
/// receiver goes away. Iteration during broadcast takes no global lock.
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, UnboundedSender<BroadcastEvent>>,
    store: Arc<dyn NotificationStore>,
}

impl ConnectionRegistry {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self {
            connections: DashMap::new(),
            store,
        }
    }

    /// Registers a new live connection and hands back its event stream.
    pub fn subscribe(&self) -> (Uuid, UnboundedReceiver<BroadcastEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        self.connections.insert(id, tx);
        debug!(connection_id = %id, connections = self.connections.len(), "Connection registered");

        (id, rx)
    }

    pub fn remove(&self, id: Uuid) {
        if self.connections.remove(&id).is_some() {
            debug!(connection_id = %id, connections = self.connections.len(), "Connection removed");
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Sends `event` to every live connection and records it to the admin
    /// feed. The feed write is best-effort: a store failure is logged and
    /// swallowed so the broadcast itself cannot fail. Returns the number of
    /// connections the event was delivered to.
    pub async fn broadcast(&self, event: BroadcastEvent) -> usize {
        let mut delivered = 0;
        let mut stale = Vec::new();

        for entry in self.connections.iter() {
            if entry.value().send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                stale.push(*entry.key());
            }
        }

        for id in stale {
            self.remove(id);
        }

        let record = CreateAdminNotification {
            title: "New Message".to_string(),
            description: describe(&event.message),
            kind: event.kind.clone(),
        };

        if let Err(e) = self.store.create_admin_notification(record).await {
            warn!(error = %e, kind = %event.kind, "Failed to persist broadcast notification");
        }

        debug!(kind = %event.kind, delivered, "Broadcast delivered");

        delivered
    }
}

fn describe(message: &Value) -> String {
    match message {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
