//! Transport layer.
//!
//! This module handles communication with the browser's DevTools server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐         HTTP /json/*         ┌─────────────────┐
//! │  DevToolsHttp   │─────────────────────────────►│                 │
//! │                 │                              │  Browser        │
//! │  Connection     │◄────────────────────────────►│  DevTools       │
//! │  (event loop)   │     WebSocket per target     │  server         │
//! └───────┬─────────┘                              └─────────────────┘
//!         │ EventSink
//!         ▼
//!   EventDispatcher
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `DevToolsHttp::list` - Find a target with a `webSocketDebuggerUrl`
//! 2. `Connection::open` - Connect and spawn the event loop
//! 3. `Connection::call` - Send commands, events flow to the sink
//! 4. `Connection::shutdown` - Close locally (no closed event)
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `http` | DevTools HTTP discovery endpoints |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// DevTools HTTP endpoints.
pub mod http;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventSink};
pub use http::DevToolsHttp;
