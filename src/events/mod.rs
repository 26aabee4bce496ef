//! Event dispatch.
//!
//! The transport forwards every event into a channel. One dispatch task
//! drains it and hands each event to the handlers registered for its name.
//!
//! # Delivery Order
//!
//! | Guarantee | Scope |
//! |-----------|-------|
//! | Arrival order | Across all events |
//! | Registration order | Handlers of one name |
//! | Named before wildcard | Handlers of one event |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `dispatcher` | Handler registry and dispatch task |
//! | `handlers` | Logging, capture and connection-closed handlers |

// ============================================================================
// Submodules
// ============================================================================

/// Handler registry and dispatch task.
pub mod dispatcher;

/// Built-in handlers.
pub mod handlers;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;

use crate::protocol::Event;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::EventDispatcher;
pub use handlers::{
    AllEventsLogger, CaptureCountdown, CaptureHandler, CaptureKind, ClosedHandler, ConsoleLogger,
    LogEntryLogger, RequestLogger, ResponseLogger,
};

// ============================================================================
// EventName
// ============================================================================

/// Registry key: one event method or every event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventName {
    /// A single method such as `DOM.documentUpdated`.
    Named(String),
    /// Every event.
    All,
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::All => f.write_str("*"),
        }
    }
}

// ============================================================================
// EventHandler
// ============================================================================

/// Receives events from the dispatcher.
///
/// Handlers run one at a time on the dispatch task and may issue protocol
/// calls. A handler that panics is not caught.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one event.
    async fn handle(&self, event: &Event);
}

#[async_trait]
impl<F> EventHandler for F
where
    F: Fn(&Event) + Send + Sync,
{
    async fn handle(&self, event: &Event) {
        self(event);
    }
}
