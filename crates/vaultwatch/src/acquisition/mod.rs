//! Page acquisition: drive the renderer with retries and hand its markup to
//! the extraction pass.

pub mod fetch;

pub use fetch::{AttemptFailure, CollectError, PositionFetcher, RetryPolicy, Timeouts};
