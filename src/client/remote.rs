//! CDP-backed [`ProtocolClient`].
//!
//! [`RemoteDebugger`] discovers targets over the DevTools HTTP endpoints and
//! drives the attached tab over a WebSocket [`Connection`]. Switching tabs
//! swaps the connection; the old one is shut down locally so it does not
//! report a closed event.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::{NavigationId, NodeId};
use crate::protocol::{
    Command, DomCommand, NavigationDecision, NetworkCommand, PageCommand, RuntimeCommand,
    SchemaCommand,
};
use crate::transport::{Connection, DevToolsHttp, EventSink};

use super::{BrowserVersion, EventDomain, ProtocolClient, TabInfo};

// ============================================================================
// RemoteDebugger
// ============================================================================

/// Client for one Chromium DevTools endpoint.
///
/// Every event read from the attached tab is pushed into the [`EventSink`]
/// given at connect time, including after tab switches.
pub struct RemoteDebugger {
    /// DevTools HTTP endpoints.
    http: DevToolsHttp,
    /// Connection to the attached tab.
    connection: RwLock<Option<Connection>>,
    /// Event destination shared by every connection.
    events: EventSink,
    /// Set once by [`ProtocolClient::close`].
    closed: AtomicBool,
}

impl std::fmt::Debug for RemoteDebugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDebugger")
            .field("endpoint", &self.http.base().as_str())
            .field("connection", &*self.connection.read())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl RemoteDebugger {
    /// Connects to the DevTools server at `endpoint` (`host:port`).
    ///
    /// Attaches to the first page target that exposes a WebSocket endpoint,
    /// opening a blank tab when there is none.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] / [`Error::Connection`] if the server is unreachable
    /// - [`Error::NoDebuggerTarget`] if no target can be attached
    pub async fn connect(endpoint: &str, events: EventSink) -> Result<Self> {
        let http = DevToolsHttp::new(endpoint)?;
        let tabs = http.list().await?;

        let ws_url = match tabs
            .iter()
            .filter(|tab| tab.is_page())
            .find_map(|tab| tab.web_socket_debugger_url.clone())
        {
            Some(url) => url,
            None => {
                debug!("No attachable page, opening a blank tab");
                http.new_tab("")
                    .await?
                    .web_socket_debugger_url
                    .ok_or_else(|| Error::no_debugger_target("new tab has no WebSocket URL"))?
            }
        };

        let connection = Connection::open(&ws_url, events.clone()).await?;
        info!(endpoint, ws_url = %ws_url, "Attached to DevTools target");

        Ok(Self {
            http,
            connection: RwLock::new(Some(connection)),
            events,
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the WebSocket URL of the attached tab.
    #[must_use]
    pub fn attached_url(&self) -> Option<String> {
        self.connection.read().as_ref().map(|c| c.url().to_string())
    }

    /// Attaches to `tab`, replacing the current connection.
    async fn attach(&self, tab: &TabInfo) -> Result<()> {
        let Some(ws_url) = tab.web_socket_debugger_url.as_deref() else {
            return Err(Error::no_debugger_target(format!(
                "tab {} has no WebSocket URL (already attached elsewhere?)",
                tab.id
            )));
        };

        if self.attached_url().as_deref() == Some(ws_url) {
            return Ok(());
        }

        let connection = Connection::open(ws_url, self.events.clone()).await?;
        let previous = self.connection.write().replace(connection);
        if let Some(previous) = previous {
            previous.shutdown();
        }

        debug!(tab_id = %tab.id, "Attached to tab");
        Ok(())
    }

    /// Sends `command` on the current connection.
    async fn call(&self, command: Command) -> Result<Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ConnectionClosed);
        }

        let connection = self
            .connection
            .read()
            .clone()
            .ok_or(Error::ConnectionClosed)?;

        connection.call(command).await
    }

    /// Decodes the base64 `data` field of a capture result.
    fn decode_data(method: &str, result: &Value) -> Result<Vec<u8>> {
        let data = result
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed_response(method, format!("missing data in {result}")))?;

        Ok(Base64Standard.decode(data)?)
    }
}

// ============================================================================
// ProtocolClient Implementation
// ============================================================================

#[async_trait]
impl ProtocolClient for RemoteDebugger {
    async fn version(&self) -> Result<BrowserVersion> {
        self.http.version().await
    }

    async fn tab_list(&self, filter: &str) -> Result<Vec<TabInfo>> {
        let tabs = self.http.list().await?;

        if filter.is_empty() {
            return Ok(tabs);
        }

        Ok(tabs
            .into_iter()
            .filter(|tab| tab.target_type == filter)
            .collect())
    }

    async fn new_tab(&self, url: &str) -> Result<TabInfo> {
        let tab = self.http.new_tab(url).await?;
        self.attach(&tab).await?;
        Ok(tab)
    }

    async fn activate_tab(&self, tab: &TabInfo) -> Result<()> {
        self.http.activate(&tab.id).await?;
        self.attach(tab).await
    }

    async fn close_tab(&self, tab: &TabInfo) -> Result<()> {
        self.http.close(&tab.id).await
    }

    async fn domains(&self) -> Result<Value> {
        let result = self.call(Command::Schema(SchemaCommand::GetDomains)).await?;
        Ok(result.get("domains").cloned().unwrap_or(result))
    }

    async fn enable_events(&self, domain: EventDomain) -> Result<()> {
        self.call(Command::enable(domain.name())).await.map(drop)
    }

    async fn get_document(&self) -> Result<Value> {
        self.call(Command::Dom(DomCommand::GetDocument)).await
    }

    async fn query_selector(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let result = self
            .call(Command::Dom(DomCommand::QuerySelector {
                node_id: node,
                selector: selector.to_string(),
            }))
            .await?;

        Ok(result
            .get("nodeId")
            .and_then(Value::as_i64)
            .and_then(NodeId::new))
    }

    async fn resolve_node(&self, node: NodeId) -> Result<Value> {
        let result = self
            .call(Command::Dom(DomCommand::ResolveNode { node_id: node }))
            .await?;
        Ok(result.get("object").cloned().unwrap_or(result))
    }

    async fn get_outer_html(&self, node: NodeId) -> Result<String> {
        let result = self
            .call(Command::Dom(DomCommand::GetOuterHtml { node_id: node }))
            .await?;

        result
            .get("outerHTML")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::malformed_response("DOM.getOuterHTML", "missing outerHTML"))
    }

    async fn set_outer_html(&self, node: NodeId, html: &str) -> Result<()> {
        self.call(Command::Dom(DomCommand::SetOuterHtml {
            node_id: node,
            outer_html: html.to_string(),
        }))
        .await
        .map(drop)
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .call(Command::Runtime(RuntimeCommand::Evaluate {
                expression: expression.to_string(),
                return_by_value: true,
            }))
            .await?;

        if let Some(details) = result.get("exceptionDetails") {
            let message = details
                .pointer("/exception/description")
                .or_else(|| details.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("uncaught exception");
            return Err(Error::evaluation(message));
        }

        let object = result.get("result").cloned().unwrap_or_default();
        if object.get("subtype").and_then(Value::as_str) == Some("error") {
            let message = object
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("error value");
            return Err(Error::evaluation(message));
        }

        Ok(object.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn capture_screenshot(&self, from_surface: bool) -> Result<Vec<u8>> {
        debug!(from_surface, "Capturing screenshot");

        let result = self
            .call(Command::Page(PageCommand::CaptureScreenshot {
                format: "png".to_string(),
                from_surface,
            }))
            .await?;

        Self::decode_data("Page.captureScreenshot", &result)
    }

    async fn print_to_pdf(&self) -> Result<Vec<u8>> {
        let result = self.call(Command::Page(PageCommand::PrintToPdf)).await?;
        Self::decode_data("Page.printToPDF", &result)
    }

    async fn set_blocked_urls(&self, patterns: &[String]) -> Result<()> {
        self.call(Command::Network(NetworkCommand::SetBlockedUrls {
            urls: patterns.to_vec(),
        }))
        .await
        .map(drop)
    }

    async fn set_control_navigations(&self, enabled: bool) -> Result<()> {
        self.call(Command::Page(PageCommand::SetControlNavigations { enabled }))
            .await
            .map(drop)
    }

    async fn process_navigation(
        &self,
        navigation: NavigationId,
        decision: NavigationDecision,
    ) -> Result<()> {
        self.call(Command::Page(PageCommand::ProcessNavigation {
            response: decision,
            navigation_id: navigation,
        }))
        .await
        .map(drop)
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let result = self
            .call(Command::Page(PageCommand::Navigate {
                url: url.to_string(),
            }))
            .await?;

        match result.get("errorText").and_then(Value::as_str) {
            Some(error_text) => Err(Error::navigation(url, error_text)),
            None => Ok(()),
        }
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if let Some(connection) = self.connection.write().take() {
            connection.shutdown();
            debug!(url = connection.url(), "Connection closed");
        }

        Ok(())
    }
}

impl Drop for RemoteDebugger {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.get_mut().take() {
            connection.shutdown();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
