//! Top-level error type and process exit codes.
//!
//! Failing to observe the page and failing to deliver the summary are kept
//! apart so an operator can tell them from the exit status alone.

use crate::acquisition::CollectError;
use crate::config::ConfigError;
use crate::notify::DeliveryError;
use std::path::PathBuf;
use thiserror::Error;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_COLLECT: u8 = 3;
pub const EXIT_DELIVERY: u8 = 4;
pub const EXIT_INPUT: u8 = 5;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to collect positions: {0}")]
    Collect(#[from] CollectError),

    #[error("failed to send notification: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("cannot read {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Non-zero process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => EXIT_CONFIG,
            Error::Collect(_) => EXIT_COLLECT,
            Error::Delivery(_) => EXIT_DELIVERY,
            Error::Input { .. } => EXIT_INPUT,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
