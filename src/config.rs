//! Session configuration.
//!
//! [`SessionConfig`] is built once at startup (from the command line or
//! the builder methods) and passed by reference to every component.
//!
//! # Example
//!
//! ```ignore
//! use cdp_pilot::{NavigationDecision, SessionConfig};
//!
//! let config = SessionConfig::new()
//!     .with_endpoint("localhost:9333")
//!     .with_target_url("https://example.com")
//!     .with_screenshot()
//!     .with_navigation_control(NavigationDecision::Cancel);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::NavigationDecision;
use crate::session::RetryPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Default DevTools endpoint.
pub const DEFAULT_ENDPOINT: &str = "localhost:9222";

/// Default target type for tab listing.
pub const DEFAULT_TAB_FILTER: &str = "page";

/// Screenshot artifact path.
pub const SCREENSHOT_PATH: &str = "screenshot.png";

/// PDF artifact path.
pub const PDF_PATH: &str = "page.pdf";

/// Permission bits for artifacts.
pub const ARTIFACT_MODE: u32 = 0o644;

// ============================================================================
// CaptureConfig
// ============================================================================

/// Which artifacts to write on document update, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Write a PNG screenshot.
    pub screenshot: bool,
    /// Write a PDF printout.
    pub pdf: bool,
    /// Screenshot destination.
    pub screenshot_path: PathBuf,
    /// PDF destination.
    pub pdf_path: PathBuf,
    /// Permission bits for created files.
    pub mode: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            screenshot: false,
            pdf: false,
            screenshot_path: PathBuf::from(SCREENSHOT_PATH),
            pdf_path: PathBuf::from(PDF_PATH),
            mode: ARTIFACT_MODE,
        }
    }
}

impl CaptureConfig {
    /// Returns `true` if any artifact is requested.
    #[inline]
    #[must_use]
    pub fn any(&self) -> bool {
        self.screenshot || self.pdf
    }
}

// ============================================================================
// SessionConfig
// ============================================================================

/// Everything one run of the session needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    // ------------------------------------------------------------------------
    // Browser and connection
    // ------------------------------------------------------------------------
    /// DevTools endpoint (`host:port`).
    pub endpoint: String,
    /// Command that starts the browser. `None` attaches to a running one.
    pub launch_command: Option<String>,
    /// Connection retry policy.
    pub retry: RetryPolicy,
    /// Verbose output.
    pub verbose: bool,

    // ------------------------------------------------------------------------
    // Information
    // ------------------------------------------------------------------------
    /// Print browser version metadata.
    pub show_version: bool,
    /// Print the tab list.
    pub list_tabs: bool,
    /// Target type shown by the tab list (empty for all).
    pub tab_filter: String,
    /// Print the supported protocol domains.
    pub list_domains: bool,

    // ------------------------------------------------------------------------
    // Tab selection
    // ------------------------------------------------------------------------
    /// URL to load. Tab selection only happens when set.
    pub target_url: Option<String>,
    /// Index of the tab to activate.
    pub tab_index: usize,
    /// Always open a new tab.
    pub new_tab: bool,

    // ------------------------------------------------------------------------
    // Event features
    // ------------------------------------------------------------------------
    /// Log network requests.
    pub log_requests: bool,
    /// Log network responses.
    pub log_responses: bool,
    /// Log browser log entries and console calls.
    pub log_console: bool,
    /// Enable every event domain and log every event.
    pub all_events: bool,
    /// Intercept navigations with this decision.
    pub navigation: Option<NavigationDecision>,
    /// URL patterns to block.
    pub blocked_urls: Vec<String>,
    /// Artifacts written on document update.
    pub capture: CaptureConfig,

    // ------------------------------------------------------------------------
    // One-shot operations
    // ------------------------------------------------------------------------
    /// Selector to query and print.
    pub query: Option<String>,
    /// Expression to evaluate and print.
    pub eval: Option<String>,
    /// Markup to replace the document element with.
    pub set_html: Option<String>,
    /// Print the document markup.
    pub outer_html: bool,

    // ------------------------------------------------------------------------
    // Waiting
    // ------------------------------------------------------------------------
    /// Wait for completion even after one-shot operations.
    pub wait: bool,
    /// Give up waiting after this long.
    pub wait_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            launch_command: None,
            retry: RetryPolicy::default(),
            verbose: false,
            show_version: false,
            list_tabs: false,
            tab_filter: DEFAULT_TAB_FILTER.to_string(),
            list_domains: false,
            target_url: None,
            tab_index: 0,
            new_tab: false,
            log_requests: false,
            log_responses: false,
            log_console: false,
            all_events: false,
            navigation: None,
            blocked_urls: Vec::new(),
            capture: CaptureConfig::default(),
            query: None,
            eval: None,
            set_html: None,
            outer_html: false,
            wait: false,
            wait_timeout: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionConfig {
    /// Sets the DevTools endpoint.
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the browser launch command.
    #[inline]
    #[must_use]
    pub fn with_launch_command(mut self, command: impl Into<String>) -> Self {
        self.launch_command = Some(command.into());
        self
    }

    /// Sets the retry policy.
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enables verbose output.
    #[inline]
    #[must_use]
    pub fn with_verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Sets the URL to load.
    #[inline]
    #[must_use]
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }

    /// Selects the tab at `index`.
    #[inline]
    #[must_use]
    pub fn with_tab_index(mut self, index: usize) -> Self {
        self.tab_index = index;
        self
    }

    /// Always opens a new tab.
    #[inline]
    #[must_use]
    pub fn with_new_tab(mut self) -> Self {
        self.new_tab = true;
        self
    }

    /// Prints the tab list.
    #[inline]
    #[must_use]
    pub fn with_tab_listing(mut self) -> Self {
        self.list_tabs = true;
        self
    }

    /// Prints the supported domains.
    #[inline]
    #[must_use]
    pub fn with_domain_listing(mut self) -> Self {
        self.list_domains = true;
        self
    }

    /// Logs network requests and responses.
    #[inline]
    #[must_use]
    pub fn with_network_logging(mut self) -> Self {
        self.log_requests = true;
        self.log_responses = true;
        self
    }

    /// Logs browser log entries and console calls.
    #[inline]
    #[must_use]
    pub fn with_console_logging(mut self) -> Self {
        self.log_console = true;
        self
    }

    /// Enables every event domain.
    #[inline]
    #[must_use]
    pub fn with_all_events(mut self) -> Self {
        self.all_events = true;
        self
    }

    /// Intercepts navigations and answers with `decision`.
    #[inline]
    #[must_use]
    pub fn with_navigation_control(mut self, decision: NavigationDecision) -> Self {
        self.navigation = Some(decision);
        self
    }

    /// Blocks URLs matching `patterns`.
    #[inline]
    #[must_use]
    pub fn with_blocked_urls(mut self, patterns: Vec<String>) -> Self {
        self.blocked_urls = patterns;
        self
    }

    /// Writes a screenshot on document update.
    #[inline]
    #[must_use]
    pub fn with_screenshot(mut self) -> Self {
        self.capture.screenshot = true;
        self
    }

    /// Writes a PDF on document update.
    #[inline]
    #[must_use]
    pub fn with_pdf(mut self) -> Self {
        self.capture.pdf = true;
        self
    }

    /// Sets where artifacts are written.
    #[inline]
    #[must_use]
    pub fn with_capture_paths(
        mut self,
        screenshot: impl Into<PathBuf>,
        pdf: impl Into<PathBuf>,
    ) -> Self {
        self.capture.screenshot_path = screenshot.into();
        self.capture.pdf_path = pdf.into();
        self
    }

    /// Queries `selector` after loading.
    #[inline]
    #[must_use]
    pub fn with_query(mut self, selector: impl Into<String>) -> Self {
        self.query = Some(selector.into());
        self
    }

    /// Evaluates `expression` after loading.
    #[inline]
    #[must_use]
    pub fn with_eval(mut self, expression: impl Into<String>) -> Self {
        self.eval = Some(expression.into());
        self
    }

    /// Replaces the document markup after loading.
    #[inline]
    #[must_use]
    pub fn with_set_html(mut self, html: impl Into<String>) -> Self {
        self.set_html = Some(html.into());
        self
    }

    /// Prints the document markup after loading.
    #[inline]
    #[must_use]
    pub fn with_outer_html(mut self) -> Self {
        self.outer_html = true;
        self
    }

    /// Waits for completion regardless of one-shot operations.
    #[inline]
    #[must_use]
    pub fn with_wait(mut self) -> Self {
        self.wait = true;
        self
    }

    /// Bounds the final wait.
    #[inline]
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }
}

// ============================================================================
// Queries
// ============================================================================

impl SessionConfig {
    /// Returns `true` if a feature that reacts to events is armed.
    #[must_use]
    pub fn has_event_features(&self) -> bool {
        self.capture.any()
            || self.log_requests
            || self.log_responses
            || self.log_console
            || self.all_events
            || self.navigation.is_some()
    }

    /// Returns whether the run waits for completion unless a one-shot
    /// operation clears it.
    #[inline]
    #[must_use]
    pub fn should_wait_by_default(&self) -> bool {
        self.has_event_features()
    }

    /// Checks the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::config("endpoint must not be empty"));
        }

        if matches!(self.query.as_deref(), Some("")) {
            return Err(Error::config("query selector must not be empty"));
        }

        if self.capture.screenshot
            && self.capture.pdf
            && self.capture.screenshot_path == self.capture.pdf_path
        {
            return Err(Error::config("screenshot and PDF paths must differ"));
        }

        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Splits a `|`-separated list of URL patterns.
///
/// Blank entries are dropped.
#[must_use]
pub fn parse_block_list(list: &str) -> Vec<String> {
    list.split('|')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new();

        assert_eq!(config.endpoint, "localhost:9222");
        assert_eq!(config.tab_filter, "page");
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.retry.interval, Duration::from_millis(500));
        assert_eq!(config.capture.screenshot_path, PathBuf::from("screenshot.png"));
        assert_eq!(config.capture.pdf_path, PathBuf::from("page.pdf"));
        assert_eq!(config.capture.mode, 0o644);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_wait_only_with_event_features() {
        assert!(!SessionConfig::new().should_wait_by_default());
        assert!(
            !SessionConfig::new()
                .with_target_url("https://example.com")
                .should_wait_by_default()
        );
        assert!(SessionConfig::new().with_screenshot().should_wait_by_default());
        assert!(SessionConfig::new().with_console_logging().should_wait_by_default());
        assert!(
            SessionConfig::new()
                .with_navigation_control(NavigationDecision::Proceed)
                .should_wait_by_default()
        );
    }

    #[test]
    fn test_parse_block_list() {
        assert_eq!(
            parse_block_list("*.png|https://ads.example/*| |*.gif"),
            vec!["*.png", "https://ads.example/*", "*.gif"]
        );
        assert!(parse_block_list("").is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let err = SessionConfig::new().with_endpoint("  ").validate().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_same_capture_paths() {
        let config = SessionConfig::new()
            .with_screenshot()
            .with_pdf()
            .with_capture_paths("out", "out");
        assert!(config.validate().is_err());
    }
}
