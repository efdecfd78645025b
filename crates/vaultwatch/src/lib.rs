//! vaultwatch: watch a vault's perpetual positions table and report on
//! target coins.
//!
//! A scan renders the vault page in headless Chromium, extracts the positions
//! table into [`extraction::Position`] records, and sends an alert or an
//! update depending on whether any configured coin is held.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod monitor;
pub mod notify;
pub mod renderer;

pub use error::{Error, Result};
