//! Single-shot completion signal.
//!
//! Several handlers may try to finish the run (screenshot saved, PDF saved,
//! connection closed). Only the first call to [`CompletionSignal::complete`]
//! takes effect; later calls return `false` and never block.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

// ============================================================================
// CompletionReason
// ============================================================================

/// What finished the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The browser closed the connection.
    ConnectionClosed,
    /// The screenshot handler ran.
    ScreenshotSaved,
    /// The PDF handler ran.
    PdfSaved,
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConnectionClosed => "connection closed",
            Self::ScreenshotSaved => "screenshot saved",
            Self::PdfSaved => "PDF saved",
        })
    }
}

// ============================================================================
// WaitOutcome
// ============================================================================

/// Result of waiting for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The signal fired.
    Completed(CompletionReason),
    /// The interrupt future resolved first (Ctrl-C).
    Interrupted,
    /// The deadline passed first.
    TimedOut,
}

// ============================================================================
// CompletionSignal
// ============================================================================

/// Idempotent rendezvous between event handlers and the main flow.
///
/// Cloning yields another handle to the same signal.
#[derive(Clone)]
pub struct CompletionSignal {
    state: Arc<watch::Sender<Option<CompletionReason>>>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSignal")
            .field("reason", &self.reason())
            .finish()
    }
}

impl CompletionSignal {
    /// Creates an unfired signal.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Fires the signal.
    ///
    /// Returns `true` if this call fired it, `false` if it had already fired.
    pub fn complete(&self, reason: CompletionReason) -> bool {
        let fired = self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        });

        if fired {
            debug!(%reason, "Completion signalled");
        } else {
            debug!(%reason, "Completion already signalled, ignoring");
        }
        fired
    }

    /// Returns `true` once the signal has fired.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Returns the reason of the first completion, if any.
    #[inline]
    #[must_use]
    pub fn reason(&self) -> Option<CompletionReason> {
        *self.state.borrow()
    }

    /// Waits until the signal fires.
    ///
    /// Returns immediately if it already has.
    pub async fn wait(&self) -> CompletionReason {
        let mut rx = self.state.subscribe();
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            // The sender lives in `self`, so `changed` cannot fail here.
            let _ = rx.changed().await;
        }
    }

    /// Waits for the signal, an interrupt, or an optional deadline.
    ///
    /// Completion wins when several are ready at once.
    pub async fn wait_for_completion<I>(&self, deadline: Option<Duration>, interrupt: I) -> WaitOutcome
    where
        I: Future<Output = ()>,
    {
        let expired = async {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            reason = self.wait() => WaitOutcome::Completed(reason),
            () = interrupt => WaitOutcome::Interrupted,
            () = expired => WaitOutcome::TimedOut,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
