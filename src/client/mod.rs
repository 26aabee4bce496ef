//! Protocol client abstraction.
//!
//! Every browser interaction the session performs goes through
//! [`ProtocolClient`]. [`RemoteDebugger`] implements it over the DevTools
//! HTTP endpoints and a CDP WebSocket. Tests substitute a scripted mock.
//!
//! # Operations
//!
//! | Group | Operations |
//! |-------|------------|
//! | Targets | `version`, `tab_list`, `new_tab`, `activate_tab`, `close_tab` |
//! | Domains | `domains`, `enable_events` |
//! | DOM | `get_document`, `query_selector`, `resolve_node`, `get_outer_html`, `set_outer_html` |
//! | Runtime | `evaluate` |
//! | Capture | `capture_screenshot`, `print_to_pdf`, `save_screenshot`, `save_pdf` |
//! | Network | `set_blocked_urls` |
//! | Page | `set_control_navigations`, `process_navigation`, `navigate` |

// ============================================================================
// Submodules
// ============================================================================

/// Screenshot format and artifact writing.
pub mod capture;

/// CDP-backed client.
pub mod remote;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{NavigationId, NodeId, TargetId};
use crate::protocol::NavigationDecision;

// ============================================================================
// Re-exports
// ============================================================================

pub use capture::write_artifact;
pub use remote::RemoteDebugger;

// ============================================================================
// BrowserVersion
// ============================================================================

/// Browser metadata from `/json/version`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserVersion {
    /// Browser product and version.
    #[serde(rename = "Browser", default)]
    pub browser: String,

    /// DevTools protocol version.
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,

    /// User agent string.
    #[serde(rename = "User-Agent", default)]
    pub user_agent: String,

    /// V8 version.
    #[serde(rename = "V8-Version", default)]
    pub v8_version: String,

    /// WebKit version.
    #[serde(rename = "WebKit-Version", default)]
    pub webkit_version: String,

    /// Browser-level WebSocket endpoint.
    #[serde(
        rename = "webSocketDebuggerUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub web_socket_debugger_url: Option<String>,
}

// ============================================================================
// TabInfo
// ============================================================================

/// A debuggable target from `/json/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    /// Target identifier.
    pub id: TargetId,

    /// Target type (`page`, `iframe`, `service_worker`, ...).
    #[serde(rename = "type", default)]
    pub target_type: String,

    /// Page title.
    #[serde(default)]
    pub title: String,

    /// Current URL.
    #[serde(default)]
    pub url: String,

    /// WebSocket endpoint. Absent while another client is attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_socket_debugger_url: Option<String>,
}

impl TabInfo {
    /// Returns `true` if this target is a page.
    #[inline]
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.target_type == "page"
    }
}

// ============================================================================
// EventDomain
// ============================================================================

/// A protocol domain whose events can be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventDomain {
    /// `Runtime` (console calls, exceptions).
    Runtime,
    /// `Network` (requests, responses).
    Network,
    /// `Page` (lifecycle, navigation).
    Page,
    /// `DOM` (document updates).
    Dom,
    /// `Log` (browser log entries).
    Log,
    /// `Profiler`.
    Profiler,
    /// `ServiceWorker`.
    ServiceWorker,
    /// `Security`.
    Security,
}

impl EventDomain {
    /// Domains enabled for a regular session.
    pub const DEFAULT: [Self; 5] = [Self::Runtime, Self::Network, Self::Page, Self::Dom, Self::Log];

    /// Every domain the session knows how to enable.
    pub const ALL: [Self; 8] = [
        Self::Runtime,
        Self::Network,
        Self::Page,
        Self::Dom,
        Self::Log,
        Self::Profiler,
        Self::ServiceWorker,
        Self::Security,
    ];

    /// Returns the protocol domain name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Runtime => "Runtime",
            Self::Network => "Network",
            Self::Page => "Page",
            Self::Dom => "DOM",
            Self::Log => "Log",
            Self::Profiler => "Profiler",
            Self::ServiceWorker => "ServiceWorker",
            Self::Security => "Security",
        }
    }
}

impl fmt::Display for EventDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// ProtocolClient
// ============================================================================

/// Operations the session performs against a browser.
///
/// Implementations must be shareable between the main flow and event
/// handlers, and must correlate concurrent calls themselves.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    // ------------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------------

    /// Fetches browser version metadata.
    async fn version(&self) -> Result<BrowserVersion>;

    /// Lists targets whose type equals `filter` (all targets if empty).
    async fn tab_list(&self, filter: &str) -> Result<Vec<TabInfo>>;

    /// Opens a new tab navigated to `url` and attaches to it.
    async fn new_tab(&self, url: &str) -> Result<TabInfo>;

    /// Brings `tab` to front and attaches to it.
    async fn activate_tab(&self, tab: &TabInfo) -> Result<()>;

    /// Closes `tab`.
    async fn close_tab(&self, tab: &TabInfo) -> Result<()>;

    // ------------------------------------------------------------------------
    // Domains
    // ------------------------------------------------------------------------

    /// Lists the protocol domains the attached target supports.
    async fn domains(&self) -> Result<Value>;

    /// Enables event delivery for `domain`.
    async fn enable_events(&self, domain: EventDomain) -> Result<()>;

    // ------------------------------------------------------------------------
    // DOM
    // ------------------------------------------------------------------------

    /// Fetches the current document.
    async fn get_document(&self) -> Result<Value>;

    /// Finds the first node under `node` matching `selector`.
    ///
    /// Returns `None` when nothing matches.
    async fn query_selector(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>>;

    /// Resolves `node` to a JavaScript remote object.
    async fn resolve_node(&self, node: NodeId) -> Result<Value>;

    /// Returns the outer HTML of `node`.
    async fn get_outer_html(&self, node: NodeId) -> Result<String>;

    /// Replaces the outer HTML of `node`.
    async fn set_outer_html(&self, node: NodeId, html: &str) -> Result<()>;

    // ------------------------------------------------------------------------
    // Runtime
    // ------------------------------------------------------------------------

    /// Evaluates `expression` in page context and returns its value.
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    // ------------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------------

    /// Captures the viewport as PNG.
    async fn capture_screenshot(&self, from_surface: bool) -> Result<Vec<u8>>;

    /// Prints the page as PDF.
    async fn print_to_pdf(&self) -> Result<Vec<u8>>;

    /// Captures a PNG screenshot and writes it to `path` with `mode`.
    async fn save_screenshot(&self, path: &Path, mode: u32) -> Result<()> {
        let bytes = self.capture_screenshot(true).await?;
        write_artifact(path, &bytes, mode).await
    }

    /// Prints the page as PDF and writes it to `path` with `mode`.
    async fn save_pdf(&self, path: &Path, mode: u32) -> Result<()> {
        let bytes = self.print_to_pdf().await?;
        write_artifact(path, &bytes, mode).await
    }

    // ------------------------------------------------------------------------
    // Network and Page
    // ------------------------------------------------------------------------

    /// Blocks requests matching any of `patterns`.
    async fn set_blocked_urls(&self, patterns: &[String]) -> Result<()>;

    /// Turns navigation interception on or off.
    async fn set_control_navigations(&self, enabled: bool) -> Result<()>;

    /// Answers an intercepted navigation.
    async fn process_navigation(
        &self,
        navigation: NavigationId,
        decision: NavigationDecision,
    ) -> Result<()>;

    /// Navigates the attached tab to `url`.
    async fn navigate(&self, url: &str) -> Result<()>;

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Releases the connection. Calling it again is a no-op.
    async fn close(&self) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_info_deserialization() {
        let json_str = r#"{
            "description": "",
            "devtoolsFrontendUrl": "/devtools/inspector.html?ws=localhost:9222/devtools/page/AB12",
            "id": "AB12",
            "title": "Example Domain",
            "type": "page",
            "url": "https://example.com/",
            "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/AB12"
        }"#;

        let tab: TabInfo = serde_json::from_str(json_str).expect("parse tab");
        assert_eq!(tab.id.as_str(), "AB12");
        assert!(tab.is_page());
        assert_eq!(
            tab.web_socket_debugger_url.as_deref(),
            Some("ws://localhost:9222/devtools/page/AB12")
        );
    }

    #[test]
    fn test_tab_info_attached_elsewhere() {
        let tab: TabInfo =
            serde_json::from_str(r#"{"id":"X","type":"service_worker"}"#).expect("parse tab");
        assert!(!tab.is_page());
        assert!(tab.web_socket_debugger_url.is_none());
    }

    #[test]
    fn test_browser_version_field_names() {
        let version: BrowserVersion = serde_json::from_str(
            r#"{"Browser":"Chrome/120","Protocol-Version":"1.3","V8-Version":"12.0"}"#,
        )
        .expect("parse version");

        assert_eq!(version.browser, "Chrome/120");
        assert_eq!(version.protocol_version, "1.3");
        assert_eq!(version.v8_version, "12.0");
        assert!(version.user_agent.is_empty());
    }

    #[test]
    fn test_event_domain_names() {
        assert_eq!(EventDomain::Dom.to_string(), "DOM");
        assert!(EventDomain::ALL.starts_with(&EventDomain::DEFAULT));
    }
}
