//! In-memory pub-sub handler
//!
//! Topics are created on first publish and keep every message so tests can
//! inspect what was sent.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use vigil_core::effects::{PubSubEffects, PubSubError};

/// In-memory pub-sub handler
#[derive(Debug, Clone, Default)]
pub struct MemoryPubSubHandler {
    topics: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl MemoryPubSubHandler {
    /// Create a handler with no topics
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages published to `topic`, oldest first
    pub fn published(&self, topic: &str) -> Vec<String> {
        self.topics.lock().get(topic).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl PubSubEffects for MemoryPubSubHandler {
    async fn publish(&self, topic: &str, message: &str) -> Result<String, PubSubError> {
        if topic.is_empty() {
            return Err(PubSubError::TopicNotFound(String::new()));
        }
        self.topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(message.to_string());
        Ok(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_published_messages() {
        let pubsub = MemoryPubSubHandler::new();
        let id = pubsub.publish("alerts", "disk full").await.unwrap();
        assert!(!id.is_empty());
        pubsub.publish("alerts", "disk ok").await.unwrap();

        assert_eq!(pubsub.published("alerts"), vec!["disk full", "disk ok"]);
        assert!(pubsub.published("other").is_empty());
        assert!(pubsub.publish("", "x").await.is_err());
    }
}
