//! cdp-pilot - Drive a Chromium browser from the command line.
//!
//! This library launches or attaches to a Chromium browser over the Chrome
//! DevTools Protocol (CDP) and runs one-shot operations against a tab:
//! document queries, script evaluation, screenshots, PDF export and
//! navigation interception.
//!
//! # Architecture
//!
//! - **Transport**: DevTools HTTP discovery plus one WebSocket per tab
//! - **Client**: [`ProtocolClient`] operations over the transport
//! - **Events**: a dispatch task delivers events to registered handlers
//! - **Session**: connects with retry, picks a tab, arms handlers, runs
//!   operations and waits on a single-shot [`CompletionSignal`]
//!
//! # Quick Start
//!
//! ```no_run
//! use cdp_pilot::{Result, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SessionConfig::new()
//!         .with_target_url("https://example.com")
//!         .with_screenshot();
//!
//!     let report = cdp_pilot::run(config).await?;
//!     println!("waited: {}", report.waited());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cli`] | Command-line arguments and logging setup |
//! | [`client`] | [`ProtocolClient`] trait and [`RemoteDebugger`] |
//! | [`config`] | [`SessionConfig`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | [`EventDispatcher`] and built-in handlers |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`launcher`] | Browser discovery and launch |
//! | [`output`] | JSON printing |
//! | [`protocol`] | CDP message types |
//! | [`session`] | Session orchestration |
//! | [`transport`] | WebSocket and HTTP transport |

// ============================================================================
// Modules
// ============================================================================

/// Command-line arguments and logging setup.
pub mod cli;

/// Protocol client trait and CDP implementation.
///
/// - [`ProtocolClient`] - Operations the session performs
/// - [`RemoteDebugger`] - Implementation over DevTools HTTP and WebSocket
pub mod client;

/// Session configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Event registry, dispatch task and handlers.
pub mod events;

/// Type-safe identifiers for protocol entities.
pub mod identifiers;

/// Browser discovery and launch.
pub mod launcher;

/// Console output helpers.
pub mod output;

/// CDP message types.
pub mod protocol;

/// Session orchestration.
///
/// Use [`run`] for the complete flow, or [`Session`] with a custom client.
pub mod session;

/// DevTools transport layer.
///
/// HTTP target discovery and the WebSocket connection event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{BrowserVersion, EventDomain, ProtocolClient, RemoteDebugger, TabInfo};

// Configuration
pub use config::{CaptureConfig, SessionConfig};

// Error types
pub use error::{Error, Result};

// Event types
pub use events::{EventDispatcher, EventHandler, EventName};

// Identifier types
pub use identifiers::{NavigationId, NodeId, RequestId, TargetId};

// Protocol types
pub use protocol::{Event, NavigationDecision, ParsedEvent};

// Session types
pub use session::{
    CompletionReason, CompletionSignal, RetryPolicy, RunReport, Session, SessionGuard,
    WaitOutcome, run,
};
