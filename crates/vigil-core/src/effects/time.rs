//! Time effect trait
//!
//! The execution service reads wall-clock time only through this trait so
//! that summaries can be produced deterministically under test.

use async_trait::async_trait;

/// Wall-clock and sleep capability
#[async_trait]
pub trait TimeEffects: Send + Sync {
    /// Milliseconds since the Unix epoch
    async fn current_timestamp_millis(&self) -> u64;

    /// Suspend the caller for `ms` milliseconds
    async fn sleep_ms(&self, ms: u64);
}
