//! Event message types.
//!
//! Events are notifications sent by the browser outside the request/response
//! flow. They carry a method name and a parameter object.
//!
//! # Event Types
//!
//! | Domain | Events |
//! |--------|--------|
//! | `Network` | `requestWillBeSent`, `responseReceived` |
//! | `Log` | `entryAdded` |
//! | `Runtime` | `consoleAPICalled` |
//! | `Page` | `navigationRequested` |
//! | `DOM` | `documentUpdated` |
//! | local | `RemoteDebugger.closed` (connection terminated) |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::NavigationId;

// ============================================================================
// Event Names
// ============================================================================

/// Event method names used by the session.
pub mod names {
    /// Synthesized locally when the browser closes the connection.
    pub const CLOSED: &str = "RemoteDebugger.closed";
    /// A request is about to be sent.
    pub const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";
    /// Response headers were received.
    pub const RESPONSE_RECEIVED: &str = "Network.responseReceived";
    /// A log entry was added.
    pub const LOG_ENTRY_ADDED: &str = "Log.entryAdded";
    /// A `console.*` API was called.
    pub const CONSOLE_API_CALLED: &str = "Runtime.consoleAPICalled";
    /// A navigation is waiting for a decision.
    pub const NAVIGATION_REQUESTED: &str = "Page.navigationRequested";
    /// The document was replaced; node IDs are stale.
    pub const DOCUMENT_UPDATED: &str = "DOM.documentUpdated";
}

// ============================================================================
// Event
// ============================================================================

/// An event notification from the browser.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Creates an event.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Creates the local connection-closed event.
    #[inline]
    #[must_use]
    pub fn closed() -> Self {
        Self::new(names::CLOSED, Value::Object(Default::default()))
    }

    /// Returns the domain name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event::new("DOM.documentUpdated", json!({}));
    /// assert_eq!(event.domain(), "DOM");
    /// ```
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        self.parse_internal()
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
///
/// Fields the browser left out, or sent with an unexpected type, are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// Network request about to be sent.
    RequestWillBeSent {
        /// Resource type (Document, Script, Image, ...).
        resource_type: Option<String>,
        /// URL of the document that issued the request.
        document_url: Option<String>,
        /// Request URL.
        url: Option<String>,
    },

    /// Network response received.
    ResponseReceived {
        /// Resource type.
        resource_type: Option<String>,
        /// Response URL.
        url: Option<String>,
        /// HTTP status code.
        status: Option<u16>,
        /// MIME type.
        mime_type: Option<String>,
    },

    /// Log entry added.
    LogEntryAdded {
        /// Entry source/type.
        entry_type: Option<String>,
        /// Severity level.
        level: Option<String>,
        /// Message text.
        text: Option<String>,
    },

    /// Console API called.
    ConsoleApiCalled {
        /// Call type (log, warning, error, ...).
        call_type: Option<String>,
        /// Remote objects passed to the call.
        args: Vec<Value>,
    },

    /// Navigation waiting for a decision.
    NavigationRequested {
        /// Navigation to answer.
        navigation_id: Option<NavigationId>,
        /// Destination URL.
        url: Option<String>,
    },

    /// Document replaced.
    DocumentUpdated,

    /// Connection terminated.
    Closed,

    /// Unknown event type.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Event Parsing Implementation
// ============================================================================

impl Event {
    /// Internal parsing implementation.
    fn parse_internal(&self) -> ParsedEvent {
        match self.method.as_str() {
            names::REQUEST_WILL_BE_SENT => ParsedEvent::RequestWillBeSent {
                resource_type: self.get_string("/type"),
                document_url: self.get_string("/documentURL"),
                url: self.get_string("/request/url"),
            },

            names::RESPONSE_RECEIVED => ParsedEvent::ResponseReceived {
                resource_type: self.get_string("/type"),
                url: self.get_string("/response/url"),
                status: self.get_u16("/response/status"),
                mime_type: self.get_string("/response/mimeType"),
            },

            names::LOG_ENTRY_ADDED => ParsedEvent::LogEntryAdded {
                entry_type: self
                    .get_string("/entry/type")
                    .or_else(|| self.get_string("/entry/source")),
                level: self.get_string("/entry/level"),
                text: self.get_string("/entry/text"),
            },

            names::CONSOLE_API_CALLED => ParsedEvent::ConsoleApiCalled {
                call_type: self.get_string("/type"),
                args: self
                    .params
                    .get("args")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
            },

            names::NAVIGATION_REQUESTED => ParsedEvent::NavigationRequested {
                navigation_id: self
                    .params
                    .pointer("/navigationId")
                    .and_then(Value::as_i64)
                    .map(NavigationId::new),
                url: self.get_string("/url"),
            },

            names::DOCUMENT_UPDATED => ParsedEvent::DocumentUpdated,

            names::CLOSED => ParsedEvent::Closed,

            _ => ParsedEvent::Unknown {
                method: self.method.clone(),
                params: self.params.clone(),
            },
        }
    }

    /// Gets a string at a JSON pointer into params.
    #[inline]
    fn get_string(&self, pointer: &str) -> Option<String> {
        self.params
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Gets a u16 at a JSON pointer into params.
    ///
    /// CDP sends status codes as JSON numbers that may be floats.
    #[inline]
    fn get_u16(&self, pointer: &str) -> Option<u16> {
        let value = self.params.pointer(pointer)?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|f| f as u64))
            .and_then(|n| u16::try_from(n).ok())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_event_deserialization() {
        let json_str = r#"{
            "method": "DOM.documentUpdated",
            "params": {}
        }"#;

        let event: Event = serde_json::from_str(json_str).expect("parse event");
        assert_eq!(event.domain(), "DOM");
        assert_eq!(event.event_name(), "documentUpdated");
        assert_eq!(event.parse(), ParsedEvent::DocumentUpdated);
    }

    #[test]
    fn test_event_without_params() {
        let event: Event =
            serde_json::from_str(r#"{ "method": "Page.loadEventFired" }"#).expect("parse");
        assert_eq!(event.params, Value::Null);
    }

    #[test]
    fn test_request_will_be_sent_parsing() {
        let event = Event::new(
            names::REQUEST_WILL_BE_SENT,
            json!({
                "type": "Document",
                "documentURL": "https://example.com/",
                "request": { "url": "https://example.com/", "method": "GET" }
            }),
        );

        match event.parse() {
            ParsedEvent::RequestWillBeSent {
                resource_type,
                document_url,
                url,
            } => {
                assert_eq!(resource_type.as_deref(), Some("Document"));
                assert_eq!(document_url.as_deref(), Some("https://example.com/"));
                assert_eq!(url.as_deref(), Some("https://example.com/"));
            }
            other => panic!("unexpected parsed event: {other:?}"),
        }
    }

    #[test]
    fn test_response_received_float_status() {
        let event = Event::new(
            names::RESPONSE_RECEIVED,
            json!({
                "type": "Image",
                "response": { "url": "https://example.com/a.png", "status": 200.0, "mimeType": "image/png" }
            }),
        );

        match event.parse() {
            ParsedEvent::ResponseReceived { status, mime_type, .. } => {
                assert_eq!(status, Some(200));
                assert_eq!(mime_type.as_deref(), Some("image/png"));
            }
            other => panic!("unexpected parsed event: {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let event = Event::new(names::RESPONSE_RECEIVED, json!({ "response": "not an object" }));

        assert_eq!(
            event.parse(),
            ParsedEvent::ResponseReceived {
                resource_type: None,
                url: None,
                status: None,
                mime_type: None,
            }
        );
    }

    #[test]
    fn test_navigation_requested_parsing() {
        let event = Event::new(
            names::NAVIGATION_REQUESTED,
            json!({ "navigationId": 12, "url": "https://example.org/" }),
        );

        assert_eq!(
            event.parse(),
            ParsedEvent::NavigationRequested {
                navigation_id: Some(NavigationId::new(12)),
                url: Some("https://example.org/".to_string()),
            }
        );
    }

    #[test]
    fn test_closed_event() {
        assert_eq!(Event::closed().parse(), ParsedEvent::Closed);
    }

    #[test]
    fn test_unknown_event() {
        let event = Event::new("Custom.somethingHappened", json!({ "foo": "bar" }));

        match event.parse() {
            ParsedEvent::Unknown { method, params } => {
                assert_eq!(method, "Custom.somethingHappened");
                assert_eq!(params["foo"], "bar");
            }
            other => panic!("expected Unknown variant, got {other:?}"),
        }
    }
}
