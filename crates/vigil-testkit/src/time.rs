//! Controllable clock for deterministic timestamps

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use vigil_core::effects::TimeEffects;

/// Clock that only moves when told to
///
/// `sleep_ms` advances the clock instead of waiting, so scenarios that sleep
/// finish instantly and summaries carry predictable durations.
#[derive(Debug, Clone)]
pub struct ControllableClock {
    now_ms: Arc<Mutex<u64>>,
}

impl ControllableClock {
    /// Clock starting at `start_ms`
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(Mutex::new(start_ms)),
        }
    }

    /// Current reading
    pub fn now(&self) -> u64 {
        *self.now_ms.lock()
    }

    /// Move the clock forward
    pub fn advance(&self, ms: u64) {
        let mut now = self.now_ms.lock();
        *now = now.saturating_add(ms);
    }

    /// Set an absolute reading
    pub fn set(&self, ms: u64) {
        *self.now_ms.lock() = ms;
    }
}

impl Default for ControllableClock {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl TimeEffects for ControllableClock {
    async fn current_timestamp_millis(&self) -> u64 {
        self.now()
    }

    async fn sleep_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleeping_advances_the_clock() {
        let clock = ControllableClock::new(1_000);
        clock.sleep_ms(250).await;
        assert_eq!(clock.current_timestamp_millis().await, 1_250);

        clock.set(5);
        clock.advance(u64::MAX);
        assert_eq!(clock.now(), u64::MAX);
    }
}
