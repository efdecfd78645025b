//! Notification delivery.
//!
//! The run summary is composed by [`report`] and handed to a [`Notifier`]:
//! SMTP for real runs, [`DryRunNotifier`] to print instead of sending.

pub mod report;
pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

pub use report::{build_message, Message};
pub use smtp::{SmtpConfig, SmtpNotifier};

/// Failure to hand a message to its destination.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid message: {0}")]
    Message(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Something that can deliver a subject and a body.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Prints messages to stdout instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunNotifier;

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        println!("Subject: {subject}\n\n{body}");
        Ok(())
    }
}
