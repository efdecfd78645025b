//! End-to-end scans through the public API with an in-memory renderer and a
//! notifier that records what it was asked to send.

use assert_json_diff::assert_json_eq;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vaultwatch::acquisition::RetryPolicy;
use vaultwatch::config::WatchConfig;
use vaultwatch::error::{EXIT_COLLECT, EXIT_DELIVERY};
use vaultwatch::extraction::extract_positions;
use vaultwatch::monitor::run_scan;
use vaultwatch::notify::{DeliveryError, Notifier};
use vaultwatch::renderer::{
    NavigationResult, RenderContext, RenderError, Renderer, TableTarget, WaitStage,
};

const POSITIONS_TABLE: &str = r#"
<table>
  <thead><tr>
    <th>Coin</th><th>Leverage</th><th>Size</th>
    <th>Mark Price</th><th>PNL (ROE %)</th><th>Position Value</th>
  </tr></thead>
  <tbody>
    <tr><td>BTC-PERP</td><td>20x</td><td>1</td><td>$60,000</td><td>+$150 (5%)</td><td>$60,000.00</td></tr>
    <tr><td>DOGE-PERP</td><td>3x</td><td>10,000</td><td>$0.12</td><td>-$4 (-1%)</td><td>$1,200.00</td></tr>
    <tr><td>ETH-PERP</td><td>10x</td><td>2.5</td><td>$3,000</td><td>$0 (0%)</td><td></td></tr>
  </tbody>
</table>"#;

const NO_TARGETS_TABLE: &str = r#"
<table>
  <thead><tr><th>Coin</th><th>Leverage</th><th>Size</th><th>Mark Price</th><th>PNL</th></tr></thead>
  <tbody><tr><td>DOGE-PERP</td><td>3x</td><td>10,000</td><td>$0.12</td><td>-$4</td></tr></tbody>
</table>"#;

// ── Scripted renderer ──

#[derive(Clone)]
enum Page {
    Timeout,
    Empty,
    Html(&'static str),
}

struct FakeRenderer {
    pages: Arc<Mutex<VecDeque<Page>>>,
}

impl FakeRenderer {
    fn new(pages: Vec<Page>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages.into())),
        }
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, RenderError> {
        Ok(Box::new(FakeContext {
            pages: Arc::clone(&self.pages),
            current: Page::Empty,
        }))
    }
}

struct FakeContext {
    pages: Arc<Mutex<VecDeque<Page>>>,
    current: Page,
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(
        &mut self,
        url: &str,
        timeout_ms: u64,
    ) -> Result<NavigationResult, RenderError> {
        self.current = self.pages.lock().unwrap().pop_front().unwrap_or(Page::Empty);
        if let Page::Timeout = self.current {
            return Err(RenderError::Timeout {
                stage: WaitStage::Navigation,
                timeout_ms,
            });
        }
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 5,
        })
    }

    async fn wait_for_network_idle(&mut self, _timeout_ms: u64) -> Result<(), RenderError> {
        Ok(())
    }

    async fn wait_for_visible(
        &mut self,
        _target: &TableTarget,
        _timeout_ms: u64,
    ) -> Result<(), RenderError> {
        Ok(())
    }

    async fn outer_html(&mut self, _target: &TableTarget) -> Result<Vec<String>, RenderError> {
        match self.current {
            Page::Html(html) => Ok(vec![html.to_string()]),
            _ => Ok(Vec::new()),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        Ok(())
    }
}

// ── Recording notifier ──

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Transport("connection refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn config() -> WatchConfig {
    WatchConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            pause: Duration::ZERO,
        },
        ..WatchConfig::default()
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap()
}

// ── Tests ──

#[tokio::test]
async fn test_alert_after_transient_timeout() {
    let renderer = FakeRenderer::new(vec![Page::Timeout, Page::Html(POSITIONS_TABLE)]);
    let notifier = RecordingNotifier::default();

    let summary = run_scan(&config(), &renderer, &notifier, now()).await.unwrap();

    assert!(summary.is_alert());
    assert_eq!(summary.positions.len(), 3);
    assert_eq!(summary.matched, vec!["BTC", "ETH"]);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let (subject, body) = &sent[0];
    assert_eq!(subject, "vaultwatch Alert: Target perp positions detected");
    assert!(body.starts_with("vaultwatch scan completed at 2026-01-15 08:00:00 UTC."));
    assert!(body.contains("- Coin: BTC-PERP (symbol: BTC)"));
    assert!(body.contains("  Position Value: $7,500.00 (computed)"));
    assert!(!body.contains("DOGE"));
    assert!(body.ends_with("Total perp positions inspected: 3"));
}

#[tokio::test]
async fn test_update_when_no_target_held() {
    let renderer = FakeRenderer::new(vec![Page::Html(NO_TARGETS_TABLE)]);
    let notifier = RecordingNotifier::default();

    let summary = run_scan(&config(), &renderer, &notifier, now()).await.unwrap();

    assert!(!summary.is_alert());
    let sent = notifier.sent();
    assert_eq!(sent[0].0, "vaultwatch Update: Target perp positions absent");
    assert!(sent[0].1.contains("Visible perp positions:"));
    assert!(sent[0].1.contains("- Coin: DOGE-PERP (symbol: DOGE)"));
    assert!(sent[0].1.ends_with("  Position Value: $1,200.00 (computed)"));
}

#[tokio::test]
async fn test_exhausted_attempts_send_nothing() {
    let renderer = FakeRenderer::new(vec![Page::Empty, Page::Timeout, Page::Empty]);
    let notifier = RecordingNotifier::default();

    let err = run_scan(&config(), &renderer, &notifier, now())
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), EXIT_COLLECT);
    assert!(err.to_string().contains("after 3 attempts"));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_is_distinct() {
    let renderer = FakeRenderer::new(vec![Page::Html(POSITIONS_TABLE)]);
    let notifier = RecordingNotifier::failing();

    let err = run_scan(&config(), &renderer, &notifier, now())
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), EXIT_DELIVERY);
}

#[test]
fn test_position_json_shape() {
    let positions = extract_positions(POSITIONS_TABLE);

    assert_json_eq!(
        serde_json::to_value(&positions[2]).unwrap(),
        json!({
            "coin_display": "ETH-PERP",
            "coin_symbol": "ETH",
            "leverage": "10x",
            "size_text": "2.5",
            "size_num": 2.5,
            "mark_price_text": "$3,000",
            "mark_price_num": 3000.0,
            "pnl_roe": "$0 (0%)",
            "position_value_text": "$7,500.00",
            "position_value_num": 7500.0,
            "position_value_source": "computed",
        })
    );
}
