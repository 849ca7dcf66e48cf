//! Pub-sub notification effect trait

use async_trait::async_trait;

/// Pub-sub errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PubSubError {
    /// Unknown topic
    #[error("Topic not found: {0}")]
    TopicNotFound(String),
    /// Backend failure
    #[error("Pub-sub backend failure: {0}")]
    Backend(String),
}

/// Pub-sub capability
#[async_trait]
pub trait PubSubEffects: Send + Sync {
    /// Publish a message to a topic and return the message identifier
    async fn publish(&self, topic: &str, message: &str) -> Result<String, PubSubError>;
}
