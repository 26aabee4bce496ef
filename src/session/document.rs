//! Multi-step DOM and script operations.
//!
//! Node IDs go stale whenever the document is replaced, so every operation
//! resolves the root again before using it.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::info;

use crate::client::ProtocolClient;
use crate::error::{Error, Result, ResultExt};
use crate::identifiers::NodeId;
use crate::output::print_json;

// ============================================================================
// QueryOutcome
// ============================================================================

/// Result of a selector query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Nothing matched.
    NoResult,
    /// A node matched; holds its resolved remote object.
    Found(Value),
}

// ============================================================================
// DocumentQuery
// ============================================================================

/// Sequences document operations against one client.
pub struct DocumentQuery<'a> {
    client: &'a dyn ProtocolClient,
    verbose: bool,
}

impl<'a> DocumentQuery<'a> {
    /// Creates an orchestrator. With `verbose`, the fetched document is
    /// printed.
    #[must_use]
    pub fn new(client: &'a dyn ProtocolClient, verbose: bool) -> Self {
        Self { client, verbose }
    }

    /// Fetches the document and returns its root node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentUnavailable`] if the document has no root.
    pub async fn root_node(&self) -> Result<NodeId> {
        let document = self.client.get_document().await.during("get document")?;

        if self.verbose {
            print_json(&document)?;
        }

        document
            .pointer("/root/nodeId")
            .and_then(Value::as_i64)
            .and_then(NodeId::new)
            .ok_or_else(|| Error::document_unavailable("document has no root node"))
    }

    /// Finds the first node matching `selector` and resolves it.
    pub async fn query(&self, selector: &str) -> Result<QueryOutcome> {
        let root = self.root_node().await?;

        let Some(node) = self
            .client
            .query_selector(root, selector)
            .await
            .during("querySelector")?
        else {
            info!("no result for {selector}");
            return Ok(QueryOutcome::NoResult);
        };

        let object = self.client.resolve_node(node).await.during("resolveNode")?;
        Ok(QueryOutcome::Found(object))
    }

    /// Evaluates `expression` as the body of a function in page context.
    ///
    /// The expression may use `return`.
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        self.client
            .evaluate(&wrap_function_body(expression))
            .await
            .during("evaluate")
    }

    /// Replaces the markup of the document element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] if the document has no `html` element.
    pub async fn set_outer_html(&self, html: &str) -> Result<()> {
        let root = self.root_node().await?;

        let node = self
            .client
            .query_selector(root, "html")
            .await
            .during("querySelector")?
            .ok_or_else(|| Error::node_not_found("html"))?;

        self.client
            .set_outer_html(node, html)
            .await
            .during("setOuterHTML")
    }

    /// Returns the markup of the whole document.
    pub async fn outer_html(&self) -> Result<String> {
        let root = self.root_node().await?;
        self.client.get_outer_html(root).await.during("getOuterHTML")
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Wraps `body` in an immediately invoked function.
#[must_use]
pub fn wrap_function_body(body: &str) -> String {
    format!("(function(){{ {body} }})()")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_function_body() {
        assert_eq!(
            wrap_function_body("return document.title"),
            "(function(){ return document.title })()"
        );
    }
}
