//! Shared test utilities: a scripted protocol client and a log capture.

#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use cdp_pilot::transport::EventSink;
use cdp_pilot::{
    BrowserVersion, Error, Event, EventDispatcher, EventDomain, NavigationDecision, NavigationId,
    NodeId, ProtocolClient, Result, Session, SessionConfig, TabInfo, TargetId,
};

// ============================================================================
// Call
// ============================================================================

/// One recorded client call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Version,
    TabList(String),
    NewTab(String),
    ActivateTab(String),
    CloseTab(String),
    Domains,
    EnableEvents(EventDomain),
    GetDocument,
    QuerySelector(String),
    ResolveNode(i64),
    GetOuterHtml,
    SetOuterHtml(String),
    Evaluate(String),
    CaptureScreenshot,
    PrintToPdf,
    SetBlockedUrls(Vec<String>),
    SetControlNavigations(bool),
    ProcessNavigation(i64, NavigationDecision),
    Navigate(String),
    Close,
}

// ============================================================================
// MockClient
// ============================================================================

/// Scripted [`ProtocolClient`].
///
/// Every call is recorded. Opening a tab or navigating pushes the queued
/// `on_load` events into the sink, the way a browser reports a page load.
pub struct MockClient {
    sink: EventSink,
    tabs: Vec<TabInfo>,
    selectors: FxHashMap<String, i64>,
    on_load: Vec<Event>,
    document_available: bool,
    evaluate_error: Option<String>,
    calls: Mutex<Vec<Call>>,
    closes: AtomicU32,
}

impl MockClient {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            tabs: Vec::new(),
            selectors: FxHashMap::default(),
            on_load: Vec::new(),
            document_available: true,
            evaluate_error: None,
            calls: Mutex::new(Vec::new()),
            closes: AtomicU32::new(0),
        }
    }

    /// Adds `count` page tabs named `tab-0`, `tab-1`, ...
    pub fn with_tabs(mut self, count: usize) -> Self {
        self.tabs = (0..count).map(|i| page_tab(&format!("tab-{i}"))).collect();
        self
    }

    /// Makes `selector` match node `node_id`.
    pub fn with_selector(mut self, selector: &str, node_id: i64) -> Self {
        self.selectors.insert(selector.to_string(), node_id);
        self
    }

    /// Queues an event emitted on every page load.
    pub fn emit_on_load(mut self, event: Event) -> Self {
        self.on_load.push(event);
        self
    }

    /// Makes `DOM.getDocument` return no root.
    pub fn without_document(mut self) -> Self {
        self.document_available = false;
        self
    }

    /// Makes evaluation throw `message`.
    pub fn with_evaluate_error(mut self, message: &str) -> Self {
        self.evaluate_error = Some(message.to_string());
        self
    }

    /// Pushes an event into the sink now.
    pub fn emit(&self, event: Event) {
        let _ = self.sink.send(event);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn page_loaded(&self) {
        for event in &self.on_load {
            self.emit(event.clone());
        }
    }
}

#[async_trait]
impl ProtocolClient for MockClient {
    async fn version(&self) -> Result<BrowserVersion> {
        self.record(Call::Version);
        Ok(BrowserVersion {
            browser: "MockChrome/1.0".to_string(),
            protocol_version: "1.3".to_string(),
            ..Default::default()
        })
    }

    async fn tab_list(&self, filter: &str) -> Result<Vec<TabInfo>> {
        self.record(Call::TabList(filter.to_string()));
        Ok(self
            .tabs
            .iter()
            .filter(|tab| filter.is_empty() || tab.target_type == filter)
            .cloned()
            .collect())
    }

    async fn new_tab(&self, url: &str) -> Result<TabInfo> {
        self.record(Call::NewTab(url.to_string()));
        let mut tab = page_tab("created");
        tab.url = url.to_string();
        self.page_loaded();
        Ok(tab)
    }

    async fn activate_tab(&self, tab: &TabInfo) -> Result<()> {
        self.record(Call::ActivateTab(tab.id.to_string()));
        Ok(())
    }

    async fn close_tab(&self, tab: &TabInfo) -> Result<()> {
        self.record(Call::CloseTab(tab.id.to_string()));
        Ok(())
    }

    async fn domains(&self) -> Result<Value> {
        self.record(Call::Domains);
        Ok(json!([{ "name": "DOM", "version": "1.3" }, { "name": "Page", "version": "1.3" }]))
    }

    async fn enable_events(&self, domain: EventDomain) -> Result<()> {
        self.record(Call::EnableEvents(domain));
        Ok(())
    }

    async fn get_document(&self) -> Result<Value> {
        self.record(Call::GetDocument);
        if self.document_available {
            Ok(json!({ "root": { "nodeId": 1, "nodeName": "#document" } }))
        } else {
            Ok(json!({}))
        }
    }

    async fn query_selector(&self, _node: NodeId, selector: &str) -> Result<Option<NodeId>> {
        self.record(Call::QuerySelector(selector.to_string()));
        Ok(self.selectors.get(selector).copied().and_then(NodeId::new))
    }

    async fn resolve_node(&self, node: NodeId) -> Result<Value> {
        self.record(Call::ResolveNode(node.as_i64()));
        Ok(json!({ "type": "object", "subtype": "node", "objectId": format!("node-{node}") }))
    }

    async fn get_outer_html(&self, _node: NodeId) -> Result<String> {
        self.record(Call::GetOuterHtml);
        Ok("<html><body>mock</body></html>".to_string())
    }

    async fn set_outer_html(&self, _node: NodeId, html: &str) -> Result<()> {
        self.record(Call::SetOuterHtml(html.to_string()));
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        self.record(Call::Evaluate(expression.to_string()));
        match &self.evaluate_error {
            Some(message) => Err(Error::evaluation(message.clone())),
            None => Ok(json!(42)),
        }
    }

    async fn capture_screenshot(&self, _from_surface: bool) -> Result<Vec<u8>> {
        self.record(Call::CaptureScreenshot);
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn print_to_pdf(&self) -> Result<Vec<u8>> {
        self.record(Call::PrintToPdf);
        Ok(b"%PDF-1.4".to_vec())
    }

    async fn set_blocked_urls(&self, patterns: &[String]) -> Result<()> {
        self.record(Call::SetBlockedUrls(patterns.to_vec()));
        Ok(())
    }

    async fn set_control_navigations(&self, enabled: bool) -> Result<()> {
        self.record(Call::SetControlNavigations(enabled));
        Ok(())
    }

    async fn process_navigation(
        &self,
        navigation: NavigationId,
        decision: NavigationDecision,
    ) -> Result<()> {
        self.record(Call::ProcessNavigation(navigation.as_i64(), decision));
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(Call::Navigate(url.to_string()));
        self.page_loaded();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(Call::Close);
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Builds a page target.
pub fn page_tab(id: &str) -> TabInfo {
    TabInfo {
        id: TargetId::new(id),
        target_type: "page".to_string(),
        title: String::new(),
        url: "about:blank".to_string(),
        web_socket_debugger_url: Some(format!("ws://mock/devtools/page/{id}")),
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A dispatcher with its running dispatch task and a mock client feeding it.
pub struct Harness {
    pub client: Arc<MockClient>,
    pub dispatcher: Arc<EventDispatcher>,
    pub dispatch_task: JoinHandle<()>,
}

impl Harness {
    /// Starts the dispatch task and builds the mock around its sink.
    pub fn new(configure: impl FnOnce(MockClient) -> MockClient) -> Self {
        let dispatcher = Arc::new(EventDispatcher::new());
        let (sink, dispatch_task) = dispatcher.start();
        let client = Arc::new(configure(MockClient::new(sink)));

        Self {
            client,
            dispatcher,
            dispatch_task,
        }
    }

    /// Returns the mock as a shared protocol client.
    pub fn protocol_client(&self) -> Arc<dyn ProtocolClient> {
        Arc::clone(&self.client) as Arc<dyn ProtocolClient>
    }

    /// Builds a session over the mock.
    pub fn session(&self, config: SessionConfig) -> Session {
        Session::new(config, self.protocol_client(), Arc::clone(&self.dispatcher))
    }
}

// ============================================================================
// LogCapture
// ============================================================================

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Installs a capturing subscriber for the current thread.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_target(false)
            .with_max_level(Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).to_string()
    }

    /// Counts log lines containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.contents().lines().filter(|line| line.contains(needle)).count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
