//! Publisher wrapper that fails appends to chosen topics.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::port::outbound::EventPublisher;

pub struct FlakyPublisher {
    inner: Arc<dyn EventPublisher>,
    broken: Mutex<HashSet<String>>,
}

impl FlakyPublisher {
    pub fn new(inner: Arc<dyn EventPublisher>) -> Self {
        Self {
            inner,
            broken: Mutex::new(HashSet::new()),
        }
    }

    /// Make every publish to `topic` fail.
    pub fn break_topic(&self, topic: &str) {
        self.broken
            .lock()
            .expect("topic lock")
            .insert(topic.to_string());
    }

    pub fn heal(&self) {
        self.broken.lock().expect("topic lock").clear();
    }
}

#[async_trait]
impl EventPublisher for FlakyPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<()> {
        let broken = self.broken.lock().expect("topic lock").contains(topic);
        if broken {
            return Err(Error::Connection(format!("topic {topic} unavailable")));
        }
        self.inner.publish(topic, key, payload).await
    }
}
