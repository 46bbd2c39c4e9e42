//! Event bus port: partitioned, durable, at-least-once.
//!
//! A consumer sees each partition's messages in append order. A message
//! that was fetched but never committed is handed out again, so every
//! consumer-side effect has to be idempotent.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// A message read from a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: String,
    pub payload: String,
}

/// Appends messages to topics.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Append `payload` to `topic`, partitioned by `key`.
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<()>;
}

/// Reads one topic on behalf of a consumer group.
#[async_trait]
pub trait EventConsumer: Send + Sync {
    /// Next uncommitted message, or `None` when caught up.
    async fn fetch(&self) -> Result<Option<Message>>;

    /// Mark `message` and everything before it in its partition as done.
    async fn commit(&self, message: &Message) -> Result<()>;
}

/// Serialize `event` as JSON and publish it.
///
/// # Errors
/// Returns an error if serialization or the append fails.
pub async fn publish_json<T: Serialize + Sync>(
    publisher: &dyn EventPublisher,
    topic: &str,
    key: &str,
    event: &T,
) -> Result<()> {
    let payload = serde_json::to_string(event)?;
    publisher.publish(topic, key, &payload).await
}
