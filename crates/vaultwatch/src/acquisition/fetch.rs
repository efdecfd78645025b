//! Fetch-retry orchestration around the renderer and extraction pass.
//!
//! One browser context is opened per run and closed when the run ends, no
//! matter how many attempts ran inside it. Each attempt navigates, waits
//! (best-effort) for the network to go quiet, waits for the positions table to
//! become visible, then extracts positions from the first match. Render
//! failures and an empty match set are retryable; the run only fails once the
//! attempt budget is spent.

use crate::extraction::{extract_positions, Position};
use crate::renderer::{RenderContext, RenderError, Renderer, TableTarget};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Bounded waits applied inside one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub navigation_ms: u64,
    /// Best-effort: running out only logs.
    pub network_idle_ms: u64,
    pub visibility_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: 45_000,
            network_idle_ms: 15_000,
            visibility_ms: 25_000,
        }
    }
}

/// How many attempts to make and how long to pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pause: Duration::from_secs(3),
        }
    }
}

/// Retryable failure of a single attempt.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    /// Timeout or navigation/browser error from the renderer.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The page rendered but the table target matched nothing.
    #[error("positions table selector {target} returned no matches")]
    NoMatch { target: String },
}

/// Terminal failure of a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The browser or its context could not be started.
    #[error("browser unavailable: {0}")]
    Browser(#[source] RenderError),

    /// Every attempt failed; `last` is the final attempt's failure.
    #[error("unable to collect positions after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: AttemptFailure,
    },
}

/// Collects positions from one page with bounded retries.
#[derive(Debug, Clone)]
pub struct PositionFetcher {
    url: String,
    target: TableTarget,
    timeouts: Timeouts,
    retry: RetryPolicy,
}

impl PositionFetcher {
    pub fn new(url: impl Into<String>, target: TableTarget) -> Self {
        Self {
            url: url.into(),
            target,
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run the attempt loop inside a single browser context.
    ///
    /// Returns the positions of the first successful attempt; an empty list is
    /// a success.
    pub async fn collect(&self, renderer: &dyn Renderer) -> Result<Vec<Position>, CollectError> {
        let mut context = renderer
            .new_context()
            .await
            .map_err(CollectError::Browser)?;

        let result = self.run_attempts(context.as_mut()).await;

        if let Err(e) = context.close().await {
            debug!("closing browser context: {e}");
        }
        result
    }

    async fn run_attempts(
        &self,
        context: &mut dyn RenderContext,
    ) -> Result<Vec<Position>, CollectError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            info!(
                "loading {} (attempt {attempt}/{max_attempts})",
                self.url
            );

            let failure = match self.attempt(context).await {
                Ok(positions) => return Ok(positions),
                Err(failure) => failure,
            };

            match &failure {
                AttemptFailure::Render(e) => warn!("browser issue on attempt {attempt}: {e}"),
                AttemptFailure::NoMatch { .. } => {
                    warn!("parsing issue on attempt {attempt}: {failure}")
                }
            }

            if attempt >= max_attempts {
                return Err(CollectError::Exhausted {
                    attempts: attempt,
                    last: failure,
                });
            }

            info!("retrying in {}ms", self.retry.pause.as_millis());
            tokio::time::sleep(self.retry.pause).await;
            attempt += 1;
        }
    }

    /// One navigate → wait → extract pass.
    async fn attempt(&self, context: &mut dyn RenderContext) -> Result<Vec<Position>, AttemptFailure> {
        let nav = context
            .navigate(&self.url, self.timeouts.navigation_ms)
            .await?;
        debug!("loaded {} in {}ms", nav.final_url, nav.load_time_ms);

        if let Err(e) = context
            .wait_for_network_idle(self.timeouts.network_idle_ms)
            .await
        {
            if e.is_timeout() {
                debug!("{e}; continuing");
            } else {
                warn!("network idle wait failed: {e}; continuing");
            }
        }

        context
            .wait_for_visible(&self.target, self.timeouts.visibility_ms)
            .await?;

        let html = context
            .outer_html(&self.target)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AttemptFailure::NoMatch {
                target: self.target.to_string(),
            })?;

        let positions = extract_positions(&html);
        info!("parsed {} perp positions from the table", positions.len());
        Ok(positions)
    }
}
