//! Command definitions organized by CDP domain.
//!
//! Commands follow CDP's `Domain.methodName` format.
//!
//! # Command Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `DOM` | Document root, selector queries, node resolution, outer HTML |
//! | `Page` | Navigation, screenshots, PDF, navigation control |
//! | `Runtime` | Expression evaluation |
//! | `Network` | URL blocking |
//! | `Schema` | Domain listing |
//! | any | `<Domain>.enable` via [`GenericCommand`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::identifiers::{NavigationId, NodeId};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by domain.
///
/// This enum wraps domain-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// DOM domain commands.
    Dom(DomCommand),
    /// Page domain commands.
    Page(PageCommand),
    /// Runtime domain commands.
    Runtime(RuntimeCommand),
    /// Network domain commands.
    Network(NetworkCommand),
    /// Schema domain commands.
    Schema(SchemaCommand),
    /// Any method by name.
    Generic(GenericCommand),
}

impl Command {
    /// Creates a `<Domain>.enable` command.
    #[inline]
    #[must_use]
    pub fn enable(domain: &str) -> Self {
        Self::Generic(GenericCommand::new(
            format!("{domain}.enable"),
            Value::Object(Default::default()),
        ))
    }

    /// Returns the CDP method name.
    #[must_use]
    pub fn method(&self) -> String {
        match self {
            Self::Generic(generic) => generic.method.clone(),
            other => serde_json::to_value(other)
                .ok()
                .and_then(|v| v.get("method").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// DOM Commands
// ============================================================================

/// DOM domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum DomCommand {
    /// Fetch the current document.
    #[serde(rename = "DOM.getDocument")]
    GetDocument,

    /// Find the first node matching a selector below `node_id`.
    #[serde(rename = "DOM.querySelector")]
    QuerySelector {
        /// Node to search under.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        /// CSS selector.
        selector: String,
    },

    /// Resolve a node to a JavaScript remote object.
    #[serde(rename = "DOM.resolveNode")]
    ResolveNode {
        /// Node to resolve.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
    },

    /// Get the outer HTML of a node.
    #[serde(rename = "DOM.getOuterHTML")]
    GetOuterHtml {
        /// Node to serialize.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
    },

    /// Replace the outer HTML of a node.
    #[serde(rename = "DOM.setOuterHTML")]
    SetOuterHtml {
        /// Node to replace.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        /// Replacement markup.
        #[serde(rename = "outerHTML")]
        outer_html: String,
    },
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Navigate the page to a URL.
    #[serde(rename = "Page.navigate")]
    Navigate {
        /// URL to navigate to.
        url: String,
    },

    /// Capture a screenshot of the page.
    #[serde(rename = "Page.captureScreenshot")]
    CaptureScreenshot {
        /// Image format. Always `png` here.
        format: String,
        /// Capture from the surface rather than the view.
        #[serde(rename = "fromSurface")]
        from_surface: bool,
    },

    /// Print the page as PDF.
    #[serde(rename = "Page.printToPDF")]
    PrintToPdf,

    /// Toggle navigation interception.
    #[serde(rename = "Page.setControlNavigations")]
    SetControlNavigations {
        /// Whether navigations wait for a decision.
        enabled: bool,
    },

    /// Answer an intercepted navigation.
    #[serde(rename = "Page.processNavigation")]
    ProcessNavigation {
        /// The decision.
        response: NavigationDecision,
        /// The navigation being answered.
        #[serde(rename = "navigationId")]
        navigation_id: NavigationId,
    },
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Evaluate an expression in page context.
    #[serde(rename = "Runtime.evaluate")]
    Evaluate {
        /// JavaScript expression.
        expression: String,
        /// Return the value itself instead of a remote object reference.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
    },
}

// ============================================================================
// Network Commands
// ============================================================================

/// Network domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum NetworkCommand {
    /// Block requests matching URL patterns (wildcards allowed).
    #[serde(rename = "Network.setBlockedURLs")]
    SetBlockedUrls {
        /// URL patterns.
        urls: Vec<String>,
    },
}

// ============================================================================
// Schema Commands
// ============================================================================

/// Schema domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum SchemaCommand {
    /// List the protocol domains the target supports.
    #[serde(rename = "Schema.getDomains")]
    GetDomains,
}

// ============================================================================
// GenericCommand
// ============================================================================

/// A command addressed by method name.
#[derive(Debug, Clone, Serialize)]
pub struct GenericCommand {
    /// CDP method name.
    pub method: String,
    /// Method parameters.
    pub params: Value,
}

impl GenericCommand {
    /// Creates a generic command.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// NavigationDecision
// ============================================================================

/// Reply to an intercepted navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NavigationDecision {
    /// Let the navigation commit.
    #[default]
    Proceed,
    /// Abort the navigation.
    Cancel,
    /// Abort the navigation and suppress further handling of it.
    CancelAndIgnore,
}

impl NavigationDecision {
    /// Returns the command-line spelling.
    #[must_use]
    pub fn cli_name(self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Cancel => "cancel",
            Self::CancelAndIgnore => "cancelIgnore",
        }
    }
}

impl fmt::Display for NavigationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Proceed => "Proceed",
            Self::Cancel => "Cancel",
            Self::CancelAndIgnore => "CancelAndIgnore",
        })
    }
}

impl FromStr for NavigationDecision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proceed" => Ok(Self::Proceed),
            "cancel" => Ok(Self::Cancel),
            "cancelIgnore" => Ok(Self::CancelAndIgnore),
            other => Err(Error::invalid_argument(format!(
                "unknown navigation decision '{other}' (expected proceed, cancel or cancelIgnore)"
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_unit_command_has_no_params() {
        let value = serde_json::to_value(Command::Dom(DomCommand::GetDocument)).expect("serialize");
        assert_eq!(value, json!({ "method": "DOM.getDocument" }));
    }

    #[test]
    fn test_query_selector_serialization() {
        let command = Command::Dom(DomCommand::QuerySelector {
            node_id: NodeId::new(1).expect("valid"),
            selector: "h1".to_string(),
        });

        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(
            value,
            json!({ "method": "DOM.querySelector", "params": { "nodeId": 1, "selector": "h1" } })
        );
    }

    #[test]
    fn test_process_navigation_wire_names() {
        let command = Command::Page(PageCommand::ProcessNavigation {
            response: NavigationDecision::CancelAndIgnore,
            navigation_id: NavigationId::new(4),
        });

        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["params"]["response"], "CancelAndIgnore");
        assert_eq!(value["params"]["navigationId"], 4);
    }

    #[test]
    fn test_screenshot_params() {
        let command = Command::Page(PageCommand::CaptureScreenshot {
            format: "png".to_string(),
            from_surface: true,
        });

        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["method"], "Page.captureScreenshot");
        assert_eq!(value["params"]["format"], "png");
        assert_eq!(value["params"]["fromSurface"], true);
    }

    #[test]
    fn test_enable_command() {
        let command = Command::enable("Network");
        assert_eq!(command.method(), "Network.enable");

        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value, json!({ "method": "Network.enable", "params": {} }));
    }

    #[test]
    fn test_method_of_typed_command() {
        let command = Command::Runtime(RuntimeCommand::Evaluate {
            expression: "1".to_string(),
            return_by_value: true,
        });
        assert_eq!(command.method(), "Runtime.evaluate");
    }

    #[test]
    fn test_navigation_decision_parsing() {
        assert_eq!("proceed".parse::<NavigationDecision>().ok(), Some(NavigationDecision::Proceed));
        assert_eq!("cancel".parse::<NavigationDecision>().ok(), Some(NavigationDecision::Cancel));
        assert_eq!(
            "cancelIgnore".parse::<NavigationDecision>().ok(),
            Some(NavigationDecision::CancelAndIgnore)
        );
        assert!("ignore".parse::<NavigationDecision>().is_err());
    }

    #[test]
    fn test_navigation_decision_names_round_trip() {
        for decision in [
            NavigationDecision::Proceed,
            NavigationDecision::Cancel,
            NavigationDecision::CancelAndIgnore,
        ] {
            assert_eq!(decision.cli_name().parse::<NavigationDecision>().ok(), Some(decision));
        }
    }
}
