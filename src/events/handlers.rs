//! Built-in event handlers.
//!
//! Logging handlers print one line per event and substitute `unknown` for
//! anything the browser left out. Capture handlers write their artifact on
//! the first `DOM.documentUpdated`. The run finishes once every armed
//! capture has written.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::client::ProtocolClient;
use crate::output::limit;
use crate::protocol::{Event, ParsedEvent};
use crate::session::completion::{CompletionReason, CompletionSignal};

use super::EventHandler;

// ============================================================================
// Constants
// ============================================================================

/// Placeholder for a missing event field.
const UNKNOWN: &str = "unknown";

/// Response URLs longer than this are truncated.
const RESPONSE_URL_LIMIT: usize = 80;

// ============================================================================
// Helper Functions
// ============================================================================

/// Returns the field or the `unknown` placeholder.
fn or_unknown(field: Option<&str>) -> &str {
    field.unwrap_or(UNKNOWN)
}

/// Renders a JSON value the way a log line shows it: strings unquoted.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders console call arguments.
///
/// Each argument shows its `value` if present. Otherwise it shows the
/// object `preview` as `Description{"name": value, ...}`. Failing both it
/// shows the remote object `type`.
#[must_use]
pub fn format_console_args(args: &[Value]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if let Some(value) = arg.get("value").filter(|v| !v.is_null()) {
                return display_value(value);
            }

            if let Some(preview) = arg.get("preview").filter(|p| p.is_object()) {
                let description = preview
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or(UNKNOWN);

                let properties = preview
                    .get("properties")
                    .and_then(Value::as_array)
                    .map(|props| {
                        props
                            .iter()
                            .map(|prop| {
                                let value = prop.get("value").map_or_else(
                                    || UNKNOWN.to_string(),
                                    display_value,
                                );
                                match prop.get("name").and_then(Value::as_str) {
                                    Some(name) => format!("{name:?}: {value}"),
                                    None => value,
                                }
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();

                return format!("{description}{{{properties}}}");
            }

            or_unknown(arg.get("type").and_then(Value::as_str)).to_string()
        })
        .collect()
}

// ============================================================================
// Logging Handlers
// ============================================================================

/// Logs `Network.requestWillBeSent`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

#[async_trait]
impl EventHandler for RequestLogger {
    async fn handle(&self, event: &Event) {
        if let ParsedEvent::RequestWillBeSent {
            resource_type,
            document_url,
            url,
        } = event.parse()
        {
            info!(
                "requestWillBeSent {} {} {}",
                or_unknown(resource_type.as_deref()),
                or_unknown(document_url.as_deref()),
                or_unknown(url.as_deref()),
            );
        }
    }
}

/// Logs `Network.responseReceived`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseLogger;

#[async_trait]
impl EventHandler for ResponseLogger {
    async fn handle(&self, event: &Event) {
        if let ParsedEvent::ResponseReceived {
            resource_type,
            url,
            status,
            mime_type,
        } = event.parse()
        {
            let status = status.map_or_else(|| UNKNOWN.to_string(), |s| s.to_string());
            info!(
                "responseReceived {} {} {} {}",
                or_unknown(resource_type.as_deref()),
                limit(or_unknown(url.as_deref()), RESPONSE_URL_LIMIT),
                status,
                or_unknown(mime_type.as_deref()),
            );
        }
    }
}

/// Logs `Log.entryAdded`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEntryLogger;

#[async_trait]
impl EventHandler for LogEntryLogger {
    async fn handle(&self, event: &Event) {
        if let ParsedEvent::LogEntryAdded {
            entry_type,
            level,
            text,
        } = event.parse()
        {
            info!(
                "LOG {} {} {}",
                or_unknown(entry_type.as_deref()),
                or_unknown(level.as_deref()),
                or_unknown(text.as_deref()),
            );
        }
    }
}

/// Logs `Runtime.consoleAPICalled`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger;

#[async_trait]
impl EventHandler for ConsoleLogger {
    async fn handle(&self, event: &Event) {
        if let ParsedEvent::ConsoleApiCalled { call_type, args } = event.parse() {
            let mut line = vec![or_unknown(call_type.as_deref()).to_string()];
            line.extend(format_console_args(&args));
            info!("CONSOLE {}", line.join(" "));
        }
    }
}

/// Logs the name of every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllEventsLogger {
    /// Log at `info` with params instead of at `debug`.
    pub verbose: bool,
}

#[async_trait]
impl EventHandler for AllEventsLogger {
    async fn handle(&self, event: &Event) {
        if self.verbose {
            info!(params = %event.params, "EVENT {}", event.method);
        } else {
            debug!("EVENT {}", event.method);
        }
    }
}

// ============================================================================
// ClosedHandler
// ============================================================================

/// Finishes the run when the browser drops the connection.
#[derive(Debug, Clone)]
pub struct ClosedHandler {
    signal: CompletionSignal,
}

impl ClosedHandler {
    /// Creates a handler firing `signal`.
    #[must_use]
    pub fn new(signal: CompletionSignal) -> Self {
        Self { signal }
    }
}

#[async_trait]
impl EventHandler for ClosedHandler {
    async fn handle(&self, _event: &Event) {
        info!("RemoteDebugger connection terminated.");
        self.signal.complete(CompletionReason::ConnectionClosed);
    }
}

// ============================================================================
// CaptureHandler
// ============================================================================

/// Artifact a [`CaptureHandler`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// PNG screenshot.
    Screenshot,
    /// PDF printout.
    Pdf,
}

impl CaptureKind {
    /// Returns the completion reason reported after capture.
    #[must_use]
    pub fn reason(self) -> CompletionReason {
        match self {
            Self::Screenshot => CompletionReason::ScreenshotSaved,
            Self::Pdf => CompletionReason::PdfSaved,
        }
    }
}

/// Fires the completion signal when the last armed capture finishes.
#[derive(Debug)]
pub struct CaptureCountdown {
    remaining: AtomicUsize,
    signal: CompletionSignal,
}

impl CaptureCountdown {
    /// Creates a countdown over `captures` handlers.
    #[must_use]
    pub fn new(captures: usize, signal: CompletionSignal) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicUsize::new(captures),
            signal,
        })
    }

    /// Returns how many captures are still outstanding.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Records one finished capture. The last one completes the signal
    /// with `reason`.
    ///
    /// Returns `true` if this call completed the signal.
    pub fn finish(&self, reason: CompletionReason) -> bool {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.signal.complete(reason),
            Ok(left) => {
                debug!(left = left - 1, "Capture finished, waiting for the rest");
                false
            }
            Err(_) => false,
        }
    }
}

/// Writes a screenshot or PDF once the document updates.
///
/// Writes at most once. The countdown is decremented even when the capture
/// fails, so the run never waits on an artifact that will not come.
pub struct CaptureHandler {
    client: Arc<dyn ProtocolClient>,
    kind: CaptureKind,
    path: PathBuf,
    mode: u32,
    countdown: Arc<CaptureCountdown>,
    written: AtomicBool,
}

impl std::fmt::Debug for CaptureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureHandler")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("mode", &format_args!("{:o}", self.mode))
            .field("written", &self.written.load(Ordering::Relaxed))
            .finish()
    }
}

impl CaptureHandler {
    /// Creates a capture handler.
    #[must_use]
    pub fn new(
        client: Arc<dyn ProtocolClient>,
        kind: CaptureKind,
        path: impl Into<PathBuf>,
        mode: u32,
        countdown: Arc<CaptureCountdown>,
    ) -> Self {
        Self {
            client,
            kind,
            path: path.into(),
            mode,
            countdown,
            written: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventHandler for CaptureHandler {
    async fn handle(&self, _event: &Event) {
        if self.written.swap(true, Ordering::AcqRel) {
            debug!(kind = ?self.kind, "Artifact already written, ignoring update");
            return;
        }

        let result = match self.kind {
            CaptureKind::Screenshot => {
                info!("document updated. taking screenshot...");
                self.client.save_screenshot(&self.path, self.mode).await
            }
            CaptureKind::Pdf => {
                info!("document updated. saving as PDF...");
                self.client.save_pdf(&self.path, self.mode).await
            }
        };

        match result {
            Ok(()) => info!(path = %self.path.display(), "Saved"),
            Err(e) => error!(path = %self.path.display(), error = %e, "Capture failed"),
        }

        self.countdown.finish(self.kind.reason());
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
    fn test_console_value_arguments() {
        let args = vec![
            json!({ "type": "string", "value": "hello" }),
            json!({ "type": "number", "value": 3 }),
            json!({ "type": "boolean", "value": false }),
        ];
        assert_eq!(format_console_args(&args), vec!["hello", "3", "false"]);
    }

    #[test]
    fn test_console_preview_argument() {
        let args = vec![json!({
            "type": "object",
            "preview": {
                "description": "Object",
                "properties": [
                    { "name": "a", "type": "number", "value": "1" },
                    { "name": "b", "type": "string", "value": "x" }
                ]
            }
        })];
        assert_eq!(format_console_args(&args), vec![r#"Object{"a": 1, "b": x}"#]);
    }

    #[test]
    fn test_console_falls_back_to_type() {
        let args = vec![json!({ "type": "undefined" }), json!({})];
        assert_eq!(format_console_args(&args), vec!["undefined", "unknown"]);
    }

    #[test]
    fn test_console_null_value_uses_preview() {
        let args = vec![json!({
            "type": "object",
            "value": null,
            "preview": { "description": "Array(0)", "properties": [] }
        })];
        assert_eq!(format_console_args(&args), vec!["Array(0){}"]);
    }

    #[tokio::test]
    async fn test_closed_handler_fires_once() {
        let signal = CompletionSignal::new();
        let handler = ClosedHandler::new(signal.clone());

        handler.handle(&Event::closed()).await;
        handler.handle(&Event::closed()).await;

        assert_eq!(signal.reason(), Some(CompletionReason::ConnectionClosed));
    }

    #[test]
    fn test_countdown_completes_on_last_capture() {
        let signal = CompletionSignal::new();
        let countdown = CaptureCountdown::new(2, signal.clone());

        assert!(!countdown.finish(CompletionReason::ScreenshotSaved));
        assert!(!signal.is_complete());
        assert_eq!(countdown.remaining(), 1);

        assert!(countdown.finish(CompletionReason::PdfSaved));
        assert_eq!(signal.reason(), Some(CompletionReason::PdfSaved));

        assert!(!countdown.finish(CompletionReason::ScreenshotSaved));
        assert_eq!(countdown.remaining(), 0);
    }

    #[tokio::test]
    async fn test_logging_handlers_tolerate_missing_fields() {
        let empty = Event::new(crate::protocol::names::RESPONSE_RECEIVED, json!(null));
        ResponseLogger.handle(&empty).await;

        let malformed = Event::new(
            crate::protocol::names::CONSOLE_API_CALLED,
            json!({ "type": 5, "args": "nope" }),
        );
        ConsoleLogger.handle(&malformed).await;
    }
}
