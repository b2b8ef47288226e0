//! Lifecycle notifications.
//!
//! The adapter publishes an [`AdapterEvent`] at each registration, lifecycle
//! and per-request milestone. Consumers subscribe through [`EventBus`]; a bus
//! without subscribers simply drops events.
use std::net::SocketAddr;

use tokio::sync::broadcast;

use crate::core::method::HttpMethod;

/// Something observable happened inside the adapter.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AdapterEvent {
    /// One method of a route was bound to the transport.
    MethodRegistered { method: HttpMethod, url: String },
    /// A route descriptor finished registering.
    RouteRegistered { url: String, methods: Vec<HttpMethod> },
    Booted { routes: usize },
    Started { addr: SocketAddr },
    Stopped,
    /// A request completed through the success continuation.
    Responded {
        request_id: Option<String>,
        method: HttpMethod,
        url: String,
        status: u16,
        exit_code: i64,
    },
    /// A request completed through the failure path.
    Errored {
        request_id: Option<String>,
        method: HttpMethod,
        url: String,
        kind: &'static str,
        message: String,
    },
}

/// Broadcast channel for [`AdapterEvent`]s. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AdapterEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AdapterEvent) {
        tracing::debug!(?event, "adapter event");
        // No subscribers is a normal state.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
