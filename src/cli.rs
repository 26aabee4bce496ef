//! Command-line interface.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_ENDPOINT, DEFAULT_TAB_FILTER, SessionConfig, parse_block_list};
use crate::launcher;
use crate::protocol::NavigationDecision;
use crate::session::RetryPolicy;
use crate::session::connect::DEFAULT_MAX_ATTEMPTS;

/// Drive a Chromium browser over the DevTools protocol.
#[derive(Parser, Debug, Clone)]
#[command(name = "cdp-pilot", disable_version_flag = true)]
pub struct Cli {
    /// Command that starts the browser. Defaults to a discovered
    /// Chrome/Chromium; pass an empty string to attach only.
    #[arg(long = "cmd", value_name = "COMMAND")]
    pub cmd: Option<String>,

    /// DevTools endpoint.
    #[arg(long, value_name = "HOST:PORT", default_value = DEFAULT_ENDPOINT)]
    pub port: String,

    /// Verbose logging.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Display the remote DevTools version.
    #[arg(long, default_value_t = false)]
    pub version: bool,

    /// Show the list of open tabs.
    #[arg(long, default_value_t = false)]
    pub tabs: bool,

    /// Select the specified tab if available.
    #[arg(long = "tab", value_name = "N", default_value_t = 0)]
    pub tab: usize,

    /// Always open a new tab.
    #[arg(long = "new", default_value_t = false)]
    pub new_tab: bool,

    /// Target type shown by `--tabs`.
    #[arg(long, default_value = DEFAULT_TAB_FILTER)]
    pub filter: String,

    /// Show the list of available domains.
    #[arg(long, default_value_t = false)]
    pub domains: bool,

    /// Show request notifications.
    #[arg(long, default_value_t = false)]
    pub requests: bool,

    /// Show response notifications.
    #[arg(long, default_value_t = false)]
    pub responses: bool,

    /// Enable all events.
    #[arg(long = "all-events", default_value_t = false)]
    pub all_events: bool,

    /// Show log and console messages.
    #[arg(long = "log", default_value_t = false)]
    pub log: bool,

    /// Query the current document with a CSS selector.
    #[arg(long, value_name = "SELECTOR")]
    pub query: Option<String>,

    /// Evaluate a function body in the page.
    #[arg(long, value_name = "EXPR")]
    pub eval: Option<String>,

    /// Save a screenshot to screenshot.png.
    #[arg(long, default_value_t = false)]
    pub screenshot: bool,

    /// Save the page to page.pdf.
    #[arg(long, default_value_t = false)]
    pub pdf: bool,

    /// Control navigations: proceed, cancel or cancelIgnore.
    #[arg(long, value_name = "DECISION")]
    pub control: Option<NavigationDecision>,

    /// Block URLs or patterns, separated by '|'.
    #[arg(long, value_name = "PATTERNS")]
    pub block: Option<String>,

    /// Print the outer HTML of the current page.
    #[arg(long, default_value_t = false)]
    pub html: bool,

    /// Replace the outer HTML of the current page.
    #[arg(long = "set-html", value_name = "HTML")]
    pub set_html: Option<String>,

    /// Wait for more events.
    #[arg(long, default_value_t = false)]
    pub wait: bool,

    /// Connection attempts before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub retries: u32,

    /// Pause between connection attempts, in milliseconds.
    #[arg(long = "retry-interval-ms", default_value_t = 500)]
    pub retry_interval_ms: u64,

    /// Stop waiting for events after this many seconds.
    #[arg(long = "timeout-secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Page to load.
    #[arg(value_name = "URL")]
    pub url: Option<String>,
}

/// Drops empty string arguments.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<Cli> for SessionConfig {
    fn from(cli: Cli) -> Self {
        let launch_command = match cli.cmd {
            Some(cmd) => non_empty(Some(cmd)),
            None => launcher::default_command(),
        };

        let mut config = SessionConfig::new()
            .with_endpoint(cli.port)
            .with_retry(RetryPolicy::new(
                cli.retries,
                Duration::from_millis(cli.retry_interval_ms),
            ))
            .with_tab_index(cli.tab)
            .with_blocked_urls(cli.block.as_deref().map(parse_block_list).unwrap_or_default());

        config.launch_command = launch_command;
        config.verbose = cli.verbose;
        config.show_version = cli.version;
        config.list_tabs = cli.tabs;
        config.tab_filter = cli.filter;
        config.list_domains = cli.domains;
        config.target_url = non_empty(cli.url);
        config.new_tab = cli.new_tab;
        config.log_requests = cli.requests;
        config.log_responses = cli.responses;
        config.log_console = cli.log;
        config.all_events = cli.all_events;
        config.navigation = cli.control;
        config.capture.screenshot = cli.screenshot;
        config.capture.pdf = cli.pdf;
        config.query = non_empty(cli.query);
        config.eval = non_empty(cli.eval);
        config.set_html = non_empty(cli.set_html);
        config.outer_html = cli.html;
        config.wait = cli.wait;
        config.wait_timeout = cli.timeout_secs.map(Duration::from_secs);
        config
    }
}

/// Initializes tracing output on stderr.
///
/// `RUST_LOG` takes precedence over the `--verbose` default.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "cdp_pilot=debug"
    } else {
        "cdp_pilot=info"
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
