//! In-memory message queue handler
//!
//! Queues are created on first send. Received messages stay in flight until
//! deleted with their receipt handle; they are not redelivered.

use async_lock::Mutex;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;
use vigil_core::effects::{QueueEffects, QueueError, ReceivedMessage};

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<(String, String)>,
    in_flight: HashMap<String, String>,
}

/// In-memory message queue handler
#[derive(Debug, Clone, Default)]
pub struct MemoryQueueHandler {
    queues: Arc<Mutex<HashMap<String, QueueState>>>,
}

impl MemoryQueueHandler {
    /// Create a handler with no queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue; a no-op if it already exists
    pub async fn create_queue(&self, queue: &str) {
        self.queues.lock().await.entry(queue.to_string()).or_default();
    }

    /// Number of messages waiting to be received
    pub async fn pending_count(&self, queue: &str) -> usize {
        self.queues
            .lock()
            .await
            .get(queue)
            .map(|state| state.pending.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl QueueEffects for MemoryQueueHandler {
    async fn send_message(&self, queue: &str, body: &str) -> Result<String, QueueError> {
        let message_id = Uuid::new_v4().to_string();
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue.to_string())
            .or_default()
            .pending
            .push_back((message_id.clone(), body.to_string()));
        Ok(message_id)
    }

    async fn receive_messages(
        &self,
        queue: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;

        let take = max_messages.min(state.pending.len());
        let mut received = Vec::with_capacity(take);
        for (message_id, body) in state.pending.drain(..take) {
            let receipt_handle = Uuid::new_v4().to_string();
            state
                .in_flight
                .insert(receipt_handle.clone(), message_id.clone());
            received.push(ReceivedMessage {
                message_id,
                receipt_handle,
                body,
            });
        }
        Ok(received)
    }

    async fn delete_message(&self, queue: &str, receipt_handle: &str) -> Result<(), QueueError> {
        let mut queues = self.queues.lock().await;
        let state = queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::QueueNotFound(queue.to_string()))?;
        state
            .in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or_else(|| QueueError::UnknownReceipt(receipt_handle.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn messages_arrive_in_send_order() {
        let queue = MemoryQueueHandler::new();
        for body in ["one", "two", "three"] {
            queue.send_message("jobs", body).await.unwrap();
        }

        let first = queue.receive_messages("jobs", 2).await.unwrap();
        let bodies: Vec<_> = first.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["one", "two"]);
        assert_eq!(queue.pending_count("jobs").await, 1);

        queue
            .delete_message("jobs", &first[0].receipt_handle)
            .await
            .unwrap();
        assert_matches!(
            queue.delete_message("jobs", &first[0].receipt_handle).await,
            Err(QueueError::UnknownReceipt(_))
        );
    }

    #[tokio::test]
    async fn unknown_queue_is_an_error() {
        let queue = MemoryQueueHandler::new();
        assert_matches!(
            queue.receive_messages("absent", 1).await,
            Err(QueueError::QueueNotFound(_))
        );

        queue.create_queue("absent").await;
        assert_eq!(queue.receive_messages("absent", 1).await, Ok(Vec::new()));
    }
}
