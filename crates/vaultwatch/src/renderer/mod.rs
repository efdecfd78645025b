//! Browser rendering abstraction.
//!
//! A [`Renderer`] hands out [`RenderContext`]s (one tab each). The fetch
//! orchestrator only talks to these traits, so retry behavior is tested with
//! scripted contexts and the real browser lives in [`chromium`].

pub mod chromium;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Outcome of a successful navigation.
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// URL after redirects.
    pub final_url: String,
    /// Time until the load event, in milliseconds.
    pub load_time_ms: u64,
}

/// The element to locate on the rendered page.
///
/// `selector` is a CSS selector; when `text` is set, only matches whose text
/// content contains it (case-insensitively) count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub selector: String,
    pub text: Option<String>,
}

impl TableTarget {
    pub fn new(selector: impl Into<String>, text: Option<String>) -> Self {
        Self {
            selector: selector.into(),
            text: text.filter(|t| !t.is_empty()),
        }
    }
}

impl Default for TableTarget {
    fn default() -> Self {
        Self::new("table", Some("Coin".to_string()))
    }
}

impl fmt::Display for TableTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{}:has-text('{}')", self.selector, text),
            None => f.write_str(&self.selector),
        }
    }
}

/// Which bounded wait ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    Navigation,
    NetworkIdle,
    Visibility,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaitStage::Navigation => "navigation",
            WaitStage::NetworkIdle => "network idle wait",
            WaitStage::Visibility => "visibility wait",
        })
    }
}

/// Failure reported by a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{stage} timed out after {timeout_ms}ms")]
    Timeout { stage: WaitStage, timeout_ms: u64 },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("browser error: {0}")]
    Browser(String),
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::Timeout { .. })
    }
}

/// Source of browser contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, RenderError>;
}

/// One browser tab.
#[async_trait]
pub trait RenderContext: Send {
    /// Load `url`, failing after `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64)
        -> Result<NavigationResult, RenderError>;

    /// Wait until network activity settles, failing after `timeout_ms`.
    async fn wait_for_network_idle(&mut self, timeout_ms: u64) -> Result<(), RenderError>;

    /// Wait until at least one match of `target` is visible.
    async fn wait_for_visible(
        &mut self,
        target: &TableTarget,
        timeout_ms: u64,
    ) -> Result<(), RenderError>;

    /// Outer HTML of every current match of `target`, in document order.
    async fn outer_html(&mut self, target: &TableTarget) -> Result<Vec<String>, RenderError>;

    /// Close the context and release its resources.
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_target_display() {
        assert_eq!(TableTarget::default().to_string(), "table:has-text('Coin')");
        assert_eq!(TableTarget::new("table.positions", None).to_string(), "table.positions");
    }

    #[test]
    fn test_table_target_drops_empty_text() {
        let target = TableTarget::new("table", Some(String::new()));
        assert_eq!(target.text, None);
    }

    #[test]
    fn test_render_error_messages() {
        let err = RenderError::Timeout {
            stage: WaitStage::Visibility,
            timeout_ms: 25_000,
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "visibility wait timed out after 25000ms");
        assert!(!RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()).is_timeout());
    }
}
