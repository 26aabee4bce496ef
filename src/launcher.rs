//! Browser discovery and launch.
//!
//! # Discovery
//!
//! | OS | Candidates (first match wins) |
//! |----|-------------------------------|
//! | Linux | `headless_shell`, `chromium`, `google-chrome-beta`, `google-chrome-unstable`, `google-chrome-stable` on `PATH` |
//! | macOS | Chrome Canary, then Chrome, under `/Applications` |
//!
//! The launched process is detached: it outlives the session.

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Linux executables, in preference order.
const LINUX_CANDIDATES: &[&str] = &[
    "headless_shell",
    "chromium",
    "google-chrome-beta",
    "google-chrome-unstable",
    "google-chrome-stable",
];

/// macOS application bundles, in preference order.
const MACOS_CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome Canary.app",
    "/Applications/Google Chrome.app",
];

/// Flags appended to every discovered browser.
const DEFAULT_FLAGS: &str =
    "--remote-debugging-port=9222 --disable-extensions --disable-gpu about:blank";

// ============================================================================
// Discovery
// ============================================================================

/// Returns the base command for the first browser found on this system.
#[must_use]
pub fn discover_browser() -> Option<String> {
    if cfg!(target_os = "macos") {
        MACOS_CANDIDATES
            .iter()
            .find(|app| Path::new(app).is_dir())
            .map(|app| format!("open {app:?} --args"))
    } else if cfg!(target_os = "linux") {
        LINUX_CANDIDATES
            .iter()
            .find(|name| which::which(name).is_ok())
            .map(|name| (*name).to_string())
    } else {
        None
    }
}

/// Builds the full launch command for a base browser command.
///
/// `headless_shell` is already headless but needs `--no-sandbox`.
#[must_use]
pub fn build_command(browser: &str) -> String {
    let mode = if browser == "headless_shell" {
        "--no-sandbox"
    } else {
        "--headless"
    };
    format!("{browser} {mode} {DEFAULT_FLAGS}")
}

/// Returns the launch command for this system, if a browser was found.
#[must_use]
pub fn default_command() -> Option<String> {
    discover_browser().map(|browser| build_command(&browser))
}

// ============================================================================
// Launch
// ============================================================================

/// Starts `command` without waiting for it.
///
/// The command line is split with shell quoting rules.
///
/// # Errors
///
/// Returns [`Error::ProcessLaunchFailed`] if the command cannot be parsed
/// or spawned.
pub fn launch(command: &str) -> Result<u32> {
    let parts = shlex::split(command)
        .ok_or_else(|| Error::process_launch_failed(format!("cannot parse command: {command}")))?;

    let (program, args) = parts
        .split_first()
        .ok_or_else(|| Error::process_launch_failed("empty command"))?;

    debug!(program = %program, ?args, "Launching browser");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false)
        .spawn()
        .map_err(|e| Error::process_launch_failed(format!("{program}: {e}")))?;

    let pid = child.id().unwrap_or(0);
    info!(pid, program = %program, "Browser launched");
    Ok(pid)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_command_headless() {
        assert_eq!(
            build_command("chromium"),
            "chromium --headless --remote-debugging-port=9222 --disable-extensions --disable-gpu about:blank"
        );
    }

    #[test]
    fn test_build_command_headless_shell() {
        let command = build_command("headless_shell");
        assert!(command.starts_with("headless_shell --no-sandbox "));
        assert!(!command.contains("--headless"));
    }

    #[test]
    fn test_macos_command_splits_app_path() {
        let command = build_command(&format!("open {:?} --args", "/Applications/Google Chrome.app"));
        let parts = shlex::split(&command).expect("split");
        assert_eq!(&parts[..3], ["open", "/Applications/Google Chrome.app", "--args"]);
        assert_eq!(parts[3], "--headless");
    }

    #[test]
    fn test_launch_empty_command() {
        let err = launch("   ").unwrap_err();
        assert!(matches!(err, Error::ProcessLaunchFailed { .. }));
    }

    #[test]
    fn test_launch_unbalanced_quotes() {
        assert!(launch("chromium \"--flag").is_err());
    }

    #[tokio::test]
    async fn test_launch_missing_program() {
        let err = launch("definitely-not-a-browser-binary --headless").unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-browser-binary"));
    }
}
