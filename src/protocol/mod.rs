//! CDP message types.
//!
//! This module defines the JSON envelope exchanged with the browser over
//! the DevTools WebSocket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Client → Browser | Command request with integer `id` |
//! | `Response` | Browser → Client | Result or error for an `id` |
//! | `Event` | Browser → Client | Asynchronous notification |
//!
//! # Command Naming
//!
//! Commands follow `Domain.methodName` format:
//!
//! - `Page.navigate`
//! - `DOM.querySelector`
//! - `Network.setBlockedURLs`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by domain |
//! | `event` | Event type and typed view |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by domain.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    Command, DomCommand, GenericCommand, NavigationDecision, NetworkCommand, PageCommand,
    RuntimeCommand, SchemaCommand,
};
pub use event::{Event, ParsedEvent, names};
pub use request::{Request, Response, ResponseError};
