//! Navigation interception.
//!
//! While intercepting, the browser holds every navigation until it gets a
//! `Page.processNavigation` reply. The controller answers each request once
//! with the decision fixed for the session.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::ProtocolClient;
use crate::error::{Result, ResultExt};
use crate::events::{EventDispatcher, EventHandler};
use crate::protocol::{Event, NavigationDecision, ParsedEvent, names};

// ============================================================================
// NavigationState
// ============================================================================

/// Controller state. There is no way back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    /// Navigations proceed without asking.
    Idle,
    /// Navigations wait for a decision.
    Intercepting,
}

// ============================================================================
// NavigationController
// ============================================================================

/// Owns the interception state for one session.
pub struct NavigationController {
    client: Arc<dyn ProtocolClient>,
    decision: NavigationDecision,
    state: Mutex<NavigationState>,
}

impl std::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationController")
            .field("decision", &self.decision)
            .field("state", &self.state())
            .finish()
    }
}

impl NavigationController {
    /// Creates an idle controller answering with `decision`.
    #[must_use]
    pub fn new(client: Arc<dyn ProtocolClient>, decision: NavigationDecision) -> Self {
        Self {
            client,
            decision,
            state: Mutex::new(NavigationState::Idle),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> NavigationState {
        *self.state.lock()
    }

    /// Returns the configured decision.
    #[inline]
    #[must_use]
    pub fn decision(&self) -> NavigationDecision {
        self.decision
    }

    /// Starts intercepting navigations.
    ///
    /// The reply handler is registered before interception is switched on,
    /// so no request can arrive unanswered. A second call does nothing.
    ///
    /// # Errors
    ///
    /// Fails if the browser rejects `Page.setControlNavigations`.
    pub async fn enable(&self, dispatcher: &EventDispatcher) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state == NavigationState::Intercepting {
                debug!("Navigation control already enabled");
                return Ok(());
            }
            *state = NavigationState::Intercepting;
        }

        dispatcher.register(
            names::NAVIGATION_REQUESTED,
            NavigationReplier::new(Arc::clone(&self.client), self.decision),
        );

        self.client
            .set_control_navigations(true)
            .await
            .during("enable navigation control")?;

        info!(decision = %self.decision, "Navigation control enabled");
        Ok(())
    }
}

// ============================================================================
// NavigationReplier
// ============================================================================

/// Answers each `Page.navigationRequested` with a fixed decision.
pub struct NavigationReplier {
    client: Arc<dyn ProtocolClient>,
    decision: NavigationDecision,
}

impl NavigationReplier {
    /// Creates a replier.
    #[must_use]
    pub fn new(client: Arc<dyn ProtocolClient>, decision: NavigationDecision) -> Self {
        Self { client, decision }
    }
}

#[async_trait]
impl EventHandler for NavigationReplier {
    async fn handle(&self, event: &Event) {
        let ParsedEvent::NavigationRequested { navigation_id, url } = event.parse() else {
            return;
        };

        let url = url.as_deref().unwrap_or("unknown");
        info!("navigation requested for {url} {}", self.decision);

        let Some(navigation_id) = navigation_id else {
            warn!(url, "Navigation request without navigationId, cannot answer");
            return;
        };

        if let Err(e) = self
            .client
            .process_navigation(navigation_id, self.decision)
            .await
        {
            error!(%navigation_id, error = %e, "Failed to answer navigation request");
        }
    }
}
