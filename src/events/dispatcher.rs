//! Handler registry and dispatch task.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::protocol::Event;
use crate::transport::EventSink;

use super::{EventHandler, EventName};

// ============================================================================
// Types
// ============================================================================

/// Shared handler reference.
type HandlerRef = Arc<dyn EventHandler>;

// ============================================================================
// EventDispatcher
// ============================================================================

/// Maps event names to ordered handler lists.
///
/// Registration happens during setup; dispatch only takes read locks and
/// never holds one across an await.
#[derive(Default)]
pub struct EventDispatcher {
    /// Handlers per event method, in registration order.
    named: RwLock<FxHashMap<String, Vec<HandlerRef>>>,
    /// Handlers receiving every event, in registration order.
    wildcard: RwLock<Vec<HandlerRef>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("named", &self.named.read().len())
            .field("wildcard", &self.wildcard.read().len())
            .finish()
    }
}

impl EventDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `name`.
    pub fn register(&self, name: impl Into<EventName>, handler: impl EventHandler + 'static) {
        self.register_arc(name.into(), Arc::new(handler));
    }

    /// Appends an already shared handler to the list for `name`.
    pub fn register_arc(&self, name: EventName, handler: HandlerRef) {
        debug!(event = %name, "Handler registered");

        match name {
            EventName::Named(method) => {
                self.named.write().entry(method).or_default().push(handler);
            }
            EventName::All => self.wildcard.write().push(handler),
        }
    }

    /// Appends a handler that receives every event.
    pub fn register_all(&self, handler: impl EventHandler + 'static) {
        self.register(EventName::All, handler);
    }

    /// Returns how many handlers are registered under `name`.
    #[must_use]
    pub fn handler_count(&self, name: &EventName) -> usize {
        match name {
            EventName::Named(method) => self.named.read().get(method).map_or(0, Vec::len),
            EventName::All => self.wildcard.read().len(),
        }
    }

    /// Delivers `event` to its named handlers, then to wildcard handlers.
    ///
    /// Each handler is awaited before the next one starts.
    pub async fn dispatch(&self, event: &Event) {
        let named: Vec<HandlerRef> = self
            .named
            .read()
            .get(&event.method)
            .cloned()
            .unwrap_or_default();
        let wildcard: Vec<HandlerRef> = self.wildcard.read().clone();

        if named.is_empty() && wildcard.is_empty() {
            return;
        }

        trace!(
            method = %event.method,
            handlers = named.len() + wildcard.len(),
            "Dispatching event"
        );

        for handler in named.iter().chain(wildcard.iter()) {
            handler.handle(event).await;
        }
    }

    /// Spawns the dispatch task.
    ///
    /// Returns the sink the transport pushes events into. The task ends
    /// once every clone of the sink is dropped.
    pub fn start(self: &Arc<Self>) -> (EventSink, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let dispatcher = Arc::clone(self);

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                dispatcher.dispatch(&event).await;
            }
            debug!("Dispatch task finished");
        });

        (tx, handle)
    }
}

// ============================================================================
// Tests
// ============================================================================
