//! Error types for cdp-pilot.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use cdp_pilot::{Result, ProtocolClient};
//!
//! async fn example(client: &dyn ProtocolClient) -> Result<()> {
//!     let version = client.version().await?;
//!     println!("{}", version.browser);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`], [`Error::ProcessLaunchFailed`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionExhausted`], [`Error::ConnectionClosed`], [`Error::NoDebuggerTarget`] |
//! | Protocol | [`Error::Protocol`], [`Error::MalformedResponse`], [`Error::RequestTimeout`] |
//! | Document | [`Error::DocumentUnavailable`], [`Error::NodeNotFound`], [`Error::Evaluation`] |
//! | Context | [`Error::Failed`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`], [`Error::Url`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument.
    ///
    /// Returned when a command-line value or call argument is invalid.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Failed to launch the browser process.
    #[error("Failed to launch browser: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// A single connection attempt failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Every connection attempt failed.
    ///
    /// Fatal: the process cannot proceed without a session.
    #[error("Cannot connect to browser after {attempts} attempts: {message}")]
    ConnectionExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Cause of the last failed attempt.
        message: String,
    },

    /// WebSocket connection closed.
    ///
    /// Returned when the connection is lost during operation.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No debuggable target exposes a WebSocket endpoint.
    #[error("No debugger target available: {message}")]
    NoDebuggerTarget {
        /// Description of what was looked for.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Error response from the browser.
    ///
    /// Carries the CDP error object (`{"code", "message"}`).
    #[error("Protocol error {code}: {message}")]
    Protocol {
        /// CDP error code.
        code: i64,
        /// CDP error message.
        message: String,
    },

    /// Response did not have the expected shape.
    #[error("Malformed response for {method}: {message}")]
    MalformedResponse {
        /// Method whose response was malformed.
        method: String,
        /// What was missing or wrong.
        message: String,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Document Errors
    // ========================================================================
    /// The current document (or its root node) could not be resolved.
    #[error("Document unavailable: {message}")]
    DocumentUnavailable {
        /// Description of what was missing.
        message: String,
    },

    /// Selector matched no node where one was required.
    #[error("No node matches selector: {selector}")]
    NodeNotFound {
        /// The selector that matched nothing.
        selector: String,
    },

    /// The browser refused or failed a navigation.
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// Destination URL.
        url: String,
        /// `errorText` reported by the browser.
        message: String,
    },

    /// Script evaluation threw in page context.
    #[error("Evaluation error: {message}")]
    Evaluation {
        /// Exception description reported by the browser.
        message: String,
    },

    // ========================================================================
    // Context
    // ========================================================================
    /// An operation failed; wraps the underlying cause.
    #[error("{operation}: {source}")]
    Failed {
        /// The operation that was being performed.
        operation: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP error talking to the DevTools endpoints.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be parsed.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Binary payload was not valid base64.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(message: impl Into<String>) -> Self {
        Self::ProcessLaunchFailed {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection exhausted error.
    #[inline]
    pub fn connection_exhausted(attempts: u32, message: impl Into<String>) -> Self {
        Self::ConnectionExhausted {
            attempts,
            message: message.into(),
        }
    }

    /// Creates a no debugger target error.
    #[inline]
    pub fn no_debugger_target(message: impl Into<String>) -> Self {
        Self::NoDebuggerTarget {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Creates a malformed response error.
    #[inline]
    pub fn malformed_response(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a document unavailable error.
    #[inline]
    pub fn document_unavailable(message: impl Into<String>) -> Self {
        Self::DocumentUnavailable {
            message: message.into(),
        }
    }

    /// Creates a node not found error.
    #[inline]
    pub fn node_not_found(selector: impl Into<String>) -> Self {
        Self::NodeNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an evaluation error.
    #[inline]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Wraps this error with the operation that produced it.
    #[inline]
    #[must_use]
    pub fn during(self, operation: impl Into<String>) -> Self {
        Self::Failed {
            operation: operation.into(),
            source: Box::new(self),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection { .. }
            | Self::ConnectionExhausted { .. }
            | Self::ConnectionClosed
            | Self::NoDebuggerTarget { .. }
            | Self::WebSocket(_)
            | Self::Http(_) => true,
            Self::Failed { source, .. } => source.is_connection_error(),
            _ => false,
        }
    }

    /// Returns `true` if this error is worth another connection attempt.
    ///
    /// Exhaustion itself is final.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::NoDebuggerTarget { .. }
                | Self::RequestTimeout { .. }
                | Self::WebSocket(_)
                | Self::Http(_)
        )
    }
}

// ============================================================================
// ResultExt
// ============================================================================

/// Adds operation context to a [`Result`].
pub trait ResultExt<T> {
    /// Wraps the error, if any, with the operation that failed.
    fn during(self, operation: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[inline]
    fn during(self, operation: &str) -> Result<T> {
        self.map_err(|e| e.during(operation))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("connection refused");
        assert_eq!(err.to_string(), "Connection failed: connection refused");
    }

    #[test]
    fn test_protocol_error_display() {
        let err = Error::protocol(-32000, "No node with given id found");
        assert_eq!(
            err.to_string(),
            "Protocol error -32000: No node with given id found"
        );
    }

    #[test]
    fn test_during_wraps_source() {
        let err = Error::document_unavailable("no root").during("get document");
        assert_eq!(err.to_string(), "get document: Document unavailable: no root");

        let source = std::error::Error::source(&err).expect("has source");
        assert_eq!(source.to_string(), "Document unavailable: no root");
    }

    #[test]
    fn test_result_ext_during() {
        let result: Result<()> = Err(Error::ConnectionClosed);
        let err = result.during("cannot get version").unwrap_err();
        assert!(matches!(err, Error::Failed { .. }));
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("x").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::connection_exhausted(10, "x").is_connection_error());
        assert!(!Error::config("x").is_connection_error());
        assert!(!Error::evaluation("x").is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::connection("refused").is_recoverable());
        assert!(Error::no_debugger_target("no page").is_recoverable());
        assert!(!Error::connection_exhausted(3, "refused").is_recoverable());
        assert!(!Error::document_unavailable("x").is_recoverable());
    }

    #[test]
    fn test_request_timeout_is_retried() {
        let err = Error::request_timeout(RequestId::new(7), 30_000);
        assert!(err.to_string().contains("Request 7 timed out"));
        assert!(err.is_recoverable());
        assert!(!err.during("connect").is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
