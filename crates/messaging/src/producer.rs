use serde::Serialize;

use crate::carrier;
use crate::log::MessageLog;
use crate::{Headers, Message, Result};

/// Publishes JSON events to one topic of a message log.
#[derive(Clone)]
pub struct Producer<L: MessageLog> {
    log: L,
    topic: String,
}

impl<L: MessageLog> Producer<L> {
    /// Creates a producer for `topic`.
    pub fn new(log: L, topic: impl Into<String>) -> Self {
        Self {
            log,
            topic: topic.into(),
        }
    }

    /// Returns the topic this producer publishes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns a reference to the underlying log.
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Publishes `event` as JSON under `key`.
    ///
    /// The message carries the trace context of the publishing span.
    #[tracing::instrument(skip(self, event), fields(topic = %self.topic))]
    pub async fn publish<T: Serialize + Sync>(&self, key: &str, event: &T) -> Result<Message> {
        let payload = serde_json::to_vec(event)?;

        let mut headers = Headers::new();
        carrier::inject(&carrier::current_context(), &mut headers);

        let message = self.log.append(&self.topic, key, payload, headers).await?;

        metrics::counter!("messages_published_total").increment(1);
        tracing::info!(
            partition = message.partition,
            offset = message.offset,
            "message published"
        );

        Ok(message)
    }
}
