//! One scan: collect positions, compose the summary, deliver it.

use crate::config::WatchConfig;
use crate::extraction::Position;
use crate::notify::{build_message, report, Message, Notifier};
use crate::renderer::Renderer;
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::info;

/// Outcome of a delivered scan.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub positions: Vec<Position>,
    /// Canonical symbols of positions that matched a target coin.
    pub matched: Vec<String>,
    pub message: Message,
}

impl ScanSummary {
    pub fn is_alert(&self) -> bool {
        !self.matched.is_empty()
    }
}

/// Run a full scan. Nothing is sent if collection fails.
pub async fn run_scan(
    config: &WatchConfig,
    renderer: &dyn Renderer,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<ScanSummary> {
    let positions = config.fetcher().collect(renderer).await?;

    let matched: Vec<String> = report::select_targets(&positions, &config.target_coins)
        .into_iter()
        .map(|p| p.coin_symbol.clone())
        .collect();
    info!(
        "scraped {} positions; {} matched target coins",
        positions.len(),
        matched.len()
    );

    let message = build_message(&positions, &config.target_coins, now);
    notifier.send(&message.subject, &message.body).await?;

    Ok(ScanSummary {
        positions,
        matched,
        message,
    })
}
