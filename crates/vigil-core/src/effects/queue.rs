//! Message queue effect trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message queue errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Unknown queue
    #[error("Queue not found: {0}")]
    QueueNotFound(String),
    /// The receipt handle does not match an in-flight message
    #[error("Unknown receipt handle: {0}")]
    UnknownReceipt(String),
    /// Backend failure
    #[error("Queue backend failure: {0}")]
    Backend(String),
}

/// A message handed out by [`QueueEffects::receive_messages`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    /// Identifier assigned at send time
    pub message_id: String,
    /// Handle used to delete the message
    pub receipt_handle: String,
    /// Message body
    pub body: String,
}

/// Message queue capability
#[async_trait]
pub trait QueueEffects: Send + Sync {
    /// Enqueue a message and return its identifier
    async fn send_message(&self, queue: &str, body: &str) -> Result<String, QueueError>;

    /// Receive up to `max_messages` messages in send order
    async fn receive_messages(
        &self,
        queue: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Acknowledge (delete) a received message
    async fn delete_message(&self, queue: &str, receipt_handle: &str) -> Result<(), QueueError>;
}
