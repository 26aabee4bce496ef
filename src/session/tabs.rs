//! Tab selection.

use tracing::{debug, info};

use crate::client::{ProtocolClient, TabInfo};
use crate::error::{Result, ResultExt};

// ============================================================================
// TabSelection
// ============================================================================

/// The tab the session attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSelection {
    /// Attached tab.
    pub tab: TabInfo,
    /// URL still to navigate to. `None` when the tab was opened on it.
    pub pending_navigation: Option<String>,
    /// Whether the tab was newly created.
    pub created: bool,
}

// ============================================================================
// select_tab
// ============================================================================

/// Picks the tab to drive.
///
/// - No tabs, or `force_new`: open a new tab already at `target_url`.
/// - Otherwise activate `tabs[requested_index]`, falling back to the first
///   tab when the index is out of range, and leave `target_url` pending.
///
/// # Errors
///
/// Fails if the tab cannot be created or activated.
pub async fn select_tab(
    client: &dyn ProtocolClient,
    tabs: &[TabInfo],
    requested_index: usize,
    force_new: bool,
    target_url: &str,
) -> Result<TabSelection> {
    let Some(fallback) = tabs.first().filter(|_| !force_new) else {
        let tab = client.new_tab(target_url).await.during("open tab")?;
        info!(tab_id = %tab.id, url = target_url, "Opened new tab");
        return Ok(TabSelection {
            tab,
            pending_navigation: None,
            created: true,
        });
    };

    let tab = match tabs.get(requested_index) {
        Some(tab) => tab,
        None => {
            debug!(
                requested_index,
                available = tabs.len(),
                "Tab index out of range, using first tab"
            );
            fallback
        }
    };

    client.activate_tab(tab).await.during("activate tab")?;
    debug!(tab_id = %tab.id, "Activated tab");

    Ok(TabSelection {
        tab: tab.clone(),
        pending_navigation: Some(target_url.to_string()),
        created: false,
    })
}
