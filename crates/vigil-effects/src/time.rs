//! System clock handler

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use vigil_core::effects::TimeEffects;

/// Real time handler for production use
///
/// Stateless; delegates to the operating system clock and tokio timers.
#[derive(Debug, Clone, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TimeEffects for RealTimeHandler {
    async fn current_timestamp_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }

    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
