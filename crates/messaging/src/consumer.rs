use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::carrier;
use crate::error::HandlerError;
use crate::log::MessageLog;
use crate::{Message, MessagingError, Result};

/// Processes messages delivered by a [`Consumer`].
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one message.
    ///
    /// Returning an error leaves the message uncommitted and stops the
    /// consume loop; the message will be delivered again to the next consumer
    /// of the group.
    async fn handle(&self, message: &Message) -> std::result::Result<(), HandlerError>;
}

#[async_trait]
impl<T: MessageHandler + ?Sized> MessageHandler for Arc<T> {
    async fn handle(&self, message: &Message) -> std::result::Result<(), HandlerError> {
        (**self).handle(message).await
    }
}

/// Fetch-process-commit loop for one topic and consumer group.
///
/// Messages are processed one at a time. A message is committed only after
/// its handler returned `Ok`, which makes delivery at-least-once.
#[derive(Clone)]
pub struct Consumer<L: MessageLog> {
    log: L,
    topic: String,
    group: String,
}

impl<L: MessageLog> Consumer<L> {
    /// Creates a consumer of `topic` on behalf of `group`.
    pub fn new(log: L, topic: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            log,
            topic: topic.into(),
            group: group.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Runs the loop until `shutdown` resolves or the handler fails.
    ///
    /// Shutdown is only observed while waiting for the next message; a
    /// message already being handled always runs to completion and is
    /// committed first.
    pub async fn consume<H, F>(&self, handler: &H, shutdown: F) -> Result<()>
    where
        H: MessageHandler + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(topic = %self.topic, group = %self.group, "consumer started");

        loop {
            let message = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(topic = %self.topic, group = %self.group, "consumer stopped");
                    return Ok(());
                }
                fetched = self.log.fetch(&self.topic, &self.group) => fetched?,
            };

            if let Err(e) = self.process(handler, &message).await {
                tracing::error!(
                    topic = %self.topic,
                    group = %self.group,
                    error = %e,
                    "consumer stopped on error"
                );
                return Err(e);
            }
        }
    }

    /// Fetches, handles and commits exactly one message.
    pub async fn consume_one<H>(&self, handler: &H) -> Result<Message>
    where
        H: MessageHandler + ?Sized,
    {
        let message = self.log.fetch(&self.topic, &self.group).await?;
        self.process(handler, &message).await?;
        Ok(message)
    }

    async fn process<H>(&self, handler: &H, message: &Message) -> Result<()>
    where
        H: MessageHandler + ?Sized,
    {
        let parent = carrier::extract(&message.headers);
        let trace_id = carrier::trace_id(&parent)
            .map(|id| id.to_string())
            .unwrap_or_default();
        let span = tracing::info_span!(
            "consume",
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            key = %message.key,
            trace_id = %trace_id,
        );

        let _ = span.set_parent(parent);

        async {
            handler
                .handle(message)
                .await
                .map_err(|source| MessagingError::Handler {
                    topic: message.topic.clone(),
                    partition: message.partition,
                    offset: message.offset,
                    source,
                })?;

            self.log.commit(&self.group, message).await?;
            metrics::counter!("messages_consumed_total").increment(1);
            tracing::debug!("message committed");
            Ok::<_, MessagingError>(())
        }
        .instrument(span)
        .await
    }
}
