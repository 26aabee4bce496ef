//! Session orchestration.
//!
//! A session runs one command line against one browser:
//!
//! ```text
//! connect (retry) ─► version ─► listings ─► register handlers ─► select tab
//!        ─► prepare tab (interception, blocking, event domains) ─► navigate
//!        ─► one-shot operations ─► wait for completion (if anything is
//!        still pending) ─► close
//! ```
//!
//! Selecting a tab may replace the connection, so everything that configures
//! the page over the protocol happens after it.
//!
//! # Waiting
//!
//! The run waits at the end only when an event-driven feature is armed
//! (capture, logging, navigation control) and no one-shot operation ran,
//! or when `wait` is forced. The wait ends on the first completion, on
//! Ctrl-C, or at the optional deadline.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `completion` | Single-shot completion signal |
//! | `connect` | Bounded connection retry |
//! | `document` | Multi-step DOM and script operations |
//! | `navigation` | Navigation interception |
//! | `tabs` | Tab selection |

// ============================================================================
// Submodules
// ============================================================================

/// Single-shot completion signal.
pub mod completion;

/// Connection establishment with bounded retry.
pub mod connect;

/// Multi-step DOM and script operations.
pub mod document;

/// Navigation interception.
pub mod navigation;

/// Tab selection.
pub mod tabs;

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::{EventDomain, ProtocolClient, RemoteDebugger};
use crate::config::{DEFAULT_TAB_FILTER, SessionConfig};
use crate::error::{Result, ResultExt};
use crate::events::{
    AllEventsLogger, CaptureCountdown, CaptureHandler, CaptureKind, ClosedHandler, ConsoleLogger, EventDispatcher,
    LogEntryLogger, RequestLogger, ResponseLogger,
};
use crate::launcher;
use crate::output::print_json;
use crate::protocol::names;

// ============================================================================
// Re-exports
// ============================================================================

pub use completion::{CompletionReason, CompletionSignal, WaitOutcome};
pub use connect::{RetryPolicy, connect_with_retry};
pub use document::{DocumentQuery, QueryOutcome};
pub use navigation::{NavigationController, NavigationReplier, NavigationState};
pub use tabs::{TabSelection, select_tab};

// ============================================================================
// RunReport
// ============================================================================

/// What a run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Tab the run attached to, if a URL was given.
    pub tab: Option<TabSelection>,
    /// How the final wait ended. `None` when the run did not wait.
    pub outcome: Option<WaitOutcome>,
}

impl RunReport {
    /// Returns `true` if the run blocked on the completion signal.
    #[inline]
    #[must_use]
    pub fn waited(&self) -> bool {
        self.outcome.is_some()
    }
}

// ============================================================================
// SessionGuard
// ============================================================================

/// Closes the client exactly once on every exit path.
///
/// Call [`SessionGuard::close`] on the normal path. If the guard is dropped
/// instead (panic, early return), the close runs on a spawned task.
pub struct SessionGuard {
    client: Option<Arc<dyn ProtocolClient>>,
}

impl SessionGuard {
    /// Guards `client`.
    #[must_use]
    pub fn new(client: Arc<dyn ProtocolClient>) -> Self {
        debug!("Session guard created");
        Self {
            client: Some(client),
        }
    }

    /// Closes the client.
    pub async fn close(mut self) {
        if let Some(client) = self.client.take()
            && let Err(e) = client.close().await
        {
            // The browser may already be gone.
            if e.is_connection_error() {
                debug!(error = %e, "Connection already closed");
            } else {
                warn!(error = %e, "Failed to close connection");
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(client) = self.client.take()
            && let Ok(handle) = tokio::runtime::Handle::try_current()
        {
            handle.spawn(async move {
                if let Err(e) = client.close().await {
                    debug!(error = %e, "Failed to close connection in Drop");
                }
            });
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// One run against a connected client.
pub struct Session {
    config: SessionConfig,
    client: Arc<dyn ProtocolClient>,
    dispatcher: Arc<EventDispatcher>,
    signal: CompletionSignal,
    navigation: Option<NavigationController>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.config.endpoint)
            .field("dispatcher", &self.dispatcher)
            .field("signal", &self.signal)
            .field("navigation", &self.navigation)
            .finish()
    }
}

impl Session {
    /// Creates a session.
    ///
    /// `dispatcher` must be the one whose sink feeds `client`.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        client: Arc<dyn ProtocolClient>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        let navigation = config
            .navigation
            .map(|decision| NavigationController::new(Arc::clone(&client), decision));

        Self {
            config,
            client,
            dispatcher,
            signal: CompletionSignal::new(),
            navigation,
        }
    }

    /// Returns the completion signal.
    #[inline]
    #[must_use]
    pub fn signal(&self) -> &CompletionSignal {
        &self.signal
    }

    /// Returns the navigation controller, if navigation control is on.
    #[inline]
    #[must_use]
    pub fn navigation(&self) -> Option<&NavigationController> {
        self.navigation.as_ref()
    }

    /// Runs the session.
    ///
    /// `interrupt` cancels the final wait when it resolves.
    ///
    /// # Errors
    ///
    /// Any failure of a requested step aborts the run. A selector that
    /// matches nothing is not a failure.
    pub async fn run<I>(&self, interrupt: I) -> Result<RunReport>
    where
        I: Future<Output = ()> + Send,
    {
        let config = &self.config;
        let mut should_wait = config.should_wait_by_default();

        let version = self.client.version().await.during("get version")?;
        if config.show_version {
            print_json(&version)?;
        } else {
            info!(
                "connected to {} protocol version {}",
                version.browser, version.protocol_version
            );
        }

        if config.list_tabs {
            let tabs = self
                .client
                .tab_list(&config.tab_filter)
                .await
                .during("list tabs")?;
            print_json(&tabs)?;
            should_wait = false;
        }

        if config.list_domains {
            let domains = self.client.domains().await.during("get domains")?;
            print_json(&domains)?;
            should_wait = false;
        }

        self.register_handlers();

        let tab = match config.target_url.as_deref() {
            Some(url) => Some(self.select_tab(url).await?),
            None => None,
        };

        // After the tab switch, which replaces the connection, and before
        // navigation, which produces the events.
        self.prepare_tab().await?;

        if let Some(url) = tab.as_ref().and_then(|t| t.pending_navigation.as_deref()) {
            self.client.navigate(url).await.during("load page")?;
        }

        if self.run_operations().await? {
            should_wait = false;
        }

        let outcome = if config.wait || should_wait {
            info!("Wait for events...");
            let outcome = self
                .signal
                .wait_for_completion(config.wait_timeout, interrupt)
                .await;

            match outcome {
                WaitOutcome::Completed(reason) => debug!(%reason, "Run complete"),
                WaitOutcome::Interrupted => info!("Interrupted"),
                WaitOutcome::TimedOut => warn!(
                    timeout_secs = config.wait_timeout.map(|t| t.as_secs()),
                    "Timed out waiting for events"
                ),
            }
            Some(outcome)
        } else {
            None
        };

        info!("Closing");
        Ok(RunReport { tab, outcome })
    }

    /// Registers the handlers implied by the configuration.
    fn register_handlers(&self) {
        let config = &self.config;
        let dispatcher = &self.dispatcher;

        dispatcher.register(names::CLOSED, ClosedHandler::new(self.signal.clone()));

        if config.log_requests {
            dispatcher.register(names::REQUEST_WILL_BE_SENT, RequestLogger);
        }

        if config.log_responses {
            dispatcher.register(names::RESPONSE_RECEIVED, ResponseLogger);
        }

        if config.log_console {
            dispatcher.register(names::LOG_ENTRY_ADDED, LogEntryLogger);
            dispatcher.register(names::CONSOLE_API_CALLED, ConsoleLogger);
        }

        if config.all_events {
            dispatcher.register_all(AllEventsLogger {
                verbose: config.verbose,
            });
        }

        let capture = &config.capture;
        let countdown = CaptureCountdown::new(
            usize::from(capture.screenshot) + usize::from(capture.pdf),
            self.signal.clone(),
        );

        if capture.screenshot {
            dispatcher.register(
                names::DOCUMENT_UPDATED,
                CaptureHandler::new(
                    Arc::clone(&self.client),
                    CaptureKind::Screenshot,
                    &capture.screenshot_path,
                    capture.mode,
                    Arc::clone(&countdown),
                ),
            );
        }

        if capture.pdf {
            dispatcher.register(
                names::DOCUMENT_UPDATED,
                CaptureHandler::new(
                    Arc::clone(&self.client),
                    CaptureKind::Pdf,
                    &capture.pdf_path,
                    capture.mode,
                    Arc::clone(&countdown),
                ),
            );
        }
    }

    /// Lists page tabs and picks one for `url`.
    async fn select_tab(&self, url: &str) -> Result<TabSelection> {
        let tabs = self
            .client
            .tab_list(DEFAULT_TAB_FILTER)
            .await
            .during("list tabs")?;

        select_tab(
            self.client.as_ref(),
            &tabs,
            self.config.tab_index,
            self.config.new_tab,
            url,
        )
        .await
    }

    /// Configures the attached tab: navigation interception, URL blocking
    /// and event delivery.
    async fn prepare_tab(&self) -> Result<()> {
        let config = &self.config;

        if let Some(navigation) = &self.navigation {
            navigation.enable(&self.dispatcher).await?;
        }

        if !config.blocked_urls.is_empty() {
            self.client
                .set_blocked_urls(&config.blocked_urls)
                .await
                .during("block URLs")?;
            info!(patterns = ?config.blocked_urls, "Blocking URLs");
        }

        self.enable_event_domains().await;
        Ok(())
    }

    /// Enables event delivery. A domain the browser rejects is skipped.
    async fn enable_event_domains(&self) {
        let domains: &[EventDomain] = if self.config.all_events {
            &EventDomain::ALL
        } else {
            &EventDomain::DEFAULT
        };

        for &domain in domains {
            if let Err(e) = self.client.enable_events(domain).await {
                warn!(%domain, error = %e, "Cannot enable events");
            }
        }
    }

    /// Runs the requested one-shot operations.
    ///
    /// Returns `true` if any ran.
    async fn run_operations(&self) -> Result<bool> {
        let config = &self.config;
        let document = DocumentQuery::new(self.client.as_ref(), config.verbose);
        let mut ran = false;

        if let Some(selector) = config.query.as_deref() {
            if let QueryOutcome::Found(object) = document.query(selector).await? {
                print_json(&object)?;
            }
            ran = true;
        }

        if let Some(expression) = config.eval.as_deref() {
            let value = document.evaluate(expression).await?;
            print_json(&value)?;
            ran = true;
        }

        if let Some(html) = config.set_html.as_deref() {
            document.set_outer_html(html).await?;
            ran = true;
        }

        if config.outer_html {
            let html = document.outer_html().await?;
            info!("{html}");
            ran = true;
        }

        Ok(ran)
    }
}

// ============================================================================
// run
// ============================================================================

/// Launches (optionally), connects, runs and closes one session.
///
/// The final wait is cancelled by Ctrl-C.
///
/// # Errors
///
/// Returns the first fatal error. The connection is closed before
/// returning in every case.
pub async fn run(config: SessionConfig) -> Result<RunReport> {
    config.validate()?;

    if let Some(command) = config.launch_command.as_deref()
        && let Err(e) = launcher::launch(command)
    {
        warn!(error = %e, "cannot start browser");
    }

    let dispatcher = Arc::new(EventDispatcher::new());
    let (sink, dispatch_task) = dispatcher.start();

    let endpoint = config.endpoint.clone();
    let client = connect_with_retry(&config.retry, |attempt| {
        let sink = sink.clone();
        let endpoint = endpoint.clone();
        async move {
            debug!(attempt, endpoint = %endpoint, "Connecting");
            RemoteDebugger::connect(&endpoint, sink).await
        }
    })
    .await?;
    drop(sink);

    let client: Arc<dyn ProtocolClient> = Arc::new(client);
    let guard = SessionGuard::new(Arc::clone(&client));

    let session = Session::new(config, client, dispatcher);
    let result = session.run(interrupted()).await;

    guard.close().await;
    dispatch_task.abort();
    result
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
