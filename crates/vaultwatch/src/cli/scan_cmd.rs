//! `vaultwatch scan`: render the vault page and report on target coins.

use crate::acquisition::{CollectError, RetryPolicy, Timeouts};
use crate::cli::output::Styled;
use crate::config::{
    self, parse_coin_list, WatchConfig, DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT,
    DEFAULT_TARGET_COINS, DEFAULT_URL,
};
use crate::error::Error;
use crate::monitor;
use crate::notify::{DryRunNotifier, Notifier, SmtpConfig, SmtpNotifier};
use crate::renderer::chromium::{ChromiumRenderer, CHROMIUM_PATH_ENV};
use crate::renderer::TableTarget;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Vault page to watch
    #[arg(long, env = "VAULTWATCH_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// CSS selector of the positions table
    #[arg(long, env = "VAULTWATCH_TABLE_SELECTOR", default_value = "table")]
    pub selector: String,

    /// Text the positions table must contain (empty to disable)
    #[arg(long, env = "VAULTWATCH_TABLE_TEXT", default_value = "Coin")]
    pub table_text: String,

    /// Comma-separated coins that trigger an alert
    #[arg(long, env = "VAULTWATCH_TARGETS", default_value = DEFAULT_TARGET_COINS)]
    pub targets: String,

    #[arg(long, env = "VAULTWATCH_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Pause between attempts, in seconds
    #[arg(long, env = "VAULTWATCH_RETRY_PAUSE", default_value_t = 3)]
    pub retry_pause: u64,

    #[arg(long, env = "VAULTWATCH_NAV_TIMEOUT_MS", default_value_t = 45_000)]
    pub nav_timeout_ms: u64,

    #[arg(long, env = "VAULTWATCH_IDLE_TIMEOUT_MS", default_value_t = 15_000)]
    pub idle_timeout_ms: u64,

    #[arg(long, env = "VAULTWATCH_VISIBLE_TIMEOUT_MS", default_value_t = 25_000)]
    pub visible_timeout_ms: u64,

    /// Chromium/Chrome executable
    #[arg(long, env = CHROMIUM_PATH_ENV)]
    pub chromium: Option<PathBuf>,

    /// Print the message instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, env = "VAULTWATCH_SMTP_HOST", default_value = DEFAULT_SMTP_HOST)]
    pub smtp_host: String,

    #[arg(long, env = "VAULTWATCH_SMTP_PORT", default_value_t = DEFAULT_SMTP_PORT)]
    pub smtp_port: u16,

    #[arg(long, env = "VAULTWATCH_SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "VAULTWATCH_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Sender address (defaults to the SMTP username)
    #[arg(long, env = "VAULTWATCH_SENDER")]
    pub sender: Option<String>,

    #[arg(long, env = "VAULTWATCH_RECIPIENT")]
    pub recipient: Option<String>,
}

impl ScanArgs {
    pub fn watch_config(&self) -> WatchConfig {
        let text = Some(self.table_text.clone());
        WatchConfig {
            url: self.url.clone(),
            target: TableTarget::new(self.selector.clone(), text),
            timeouts: Timeouts {
                navigation_ms: self.nav_timeout_ms,
                network_idle_ms: self.idle_timeout_ms,
                visibility_ms: self.visible_timeout_ms,
            },
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                pause: Duration::from_secs(self.retry_pause),
            },
            target_coins: parse_coin_list(&self.targets),
        }
    }

    pub fn smtp_config(&self) -> Result<SmtpConfig, config::ConfigError> {
        config::smtp_config(
            self.smtp_host.clone(),
            self.smtp_port,
            self.smtp_username.clone(),
            self.smtp_password.clone(),
            self.sender.clone(),
            self.recipient.clone(),
        )
    }

    fn notifier(&self) -> Result<Box<dyn Notifier>, Error> {
        if self.dry_run {
            return Ok(Box::new(DryRunNotifier));
        }
        let smtp = self.smtp_config()?;
        let notifier = SmtpNotifier::new(&smtp)
            .map_err(|e| config::ConfigError::InvalidSmtp(e.to_string()))?;
        Ok(Box::new(notifier))
    }
}

/// Run the scan command.
pub async fn run(args: &ScanArgs) -> Result<()> {
    let config = args.watch_config();
    config.validate().map_err(Error::from)?;
    let notifier = args.notifier()?;

    let renderer = ChromiumRenderer::launch(args.chromium.clone())
        .await
        .map_err(|e| Error::Collect(CollectError::Browser(e)))?;

    let now = chrono::Utc::now();
    let scanned = monitor::run_scan(&config, &renderer, notifier.as_ref(), now).await;

    if let Err(e) = renderer.shutdown().await {
        warn!("browser shutdown: {e}");
    }
    let summary = scanned?;

    let s = Styled::new();
    if summary.is_alert() {
        eprintln!(
            "  {} {} ({} of {} positions)",
            s.warn_sym(),
            s.bold(&summary.matched.join(", ")),
            summary.matched.len(),
            summary.positions.len()
        );
    } else {
        eprintln!(
            "  {} no target coins held {}",
            s.ok_sym(),
            s.dim(&format!("({} positions inspected)", summary.positions.len()))
        );
    }

    Ok(())
}
