//! Run configuration: defaults, assembly from CLI/env values, validation.

use crate::acquisition::{PositionFetcher, RetryPolicy, Timeouts};
use crate::extraction::canonical_symbol;
use crate::notify::SmtpConfig;
use crate::renderer::TableTarget;
use thiserror::Error;

/// Vault page watched when no URL is given.
pub const DEFAULT_URL: &str =
    "https://app.hyperliquid.xyz/vaults/0xdfc24b077bc1425ad1dea75bcb6f8158e10df303";

/// Coins that turn a scan into an alert by default.
pub const DEFAULT_TARGET_COINS: &str = "HYPE,BTC,ETH,SOL,XRP";

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("at least one attempt is required")]
    NoAttempts,

    #[error("table selector must not be empty")]
    EmptySelector,

    #[error("no target coins configured")]
    NoTargets,

    #[error("missing SMTP setting: {0} (or use --dry-run)")]
    MissingSmtp(&'static str),

    #[error("invalid SMTP settings: {0}")]
    InvalidSmtp(String),
}

/// Everything a scan needs apart from delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    pub url: String,
    pub target: TableTarget,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
    /// Canonical symbols, in the order they were configured.
    pub target_coins: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            target: TableTarget::default(),
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
            target_coins: parse_coin_list(DEFAULT_TARGET_COINS),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if self.target.selector.trim().is_empty() {
            return Err(ConfigError::EmptySelector);
        }
        if self.target_coins.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        Ok(())
    }

    pub fn fetcher(&self) -> PositionFetcher {
        PositionFetcher::new(&self.url, self.target.clone())
            .with_timeouts(self.timeouts)
            .with_retry(self.retry)
    }
}

/// Split a comma/space separated coin list into canonical symbols.
///
/// Entries go through the same canonicalization as table cells, so
/// `"btc-perp, eth"` yields `["BTC", "ETH"]`. Duplicates and entries with no
/// symbol are dropped.
pub fn parse_coin_list(list: &str) -> Vec<String> {
    let mut coins: Vec<String> = Vec::new();
    for symbol in list
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(canonical_symbol)
    {
        if !symbol.is_empty() && !coins.contains(&symbol) {
            coins.push(symbol);
        }
    }
    coins
}

/// Assemble SMTP settings; the sender defaults to the username.
pub fn smtp_config(
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    sender: Option<String>,
    recipient: Option<String>,
) -> Result<SmtpConfig, ConfigError> {
    let username = username.ok_or(ConfigError::MissingSmtp("username"))?;
    let password = password.ok_or(ConfigError::MissingSmtp("password"))?;
    let recipient = recipient.ok_or(ConfigError::MissingSmtp("recipient"))?;
    let sender = sender.unwrap_or_else(|| username.clone());

    Ok(SmtpConfig {
        host,
        port,
        username,
        password,
        sender,
        recipient,
    })
}
