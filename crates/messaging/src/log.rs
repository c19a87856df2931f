use std::sync::Arc;

use async_trait::async_trait;

use crate::{Headers, Message, Result};

/// Number of partitions per topic unless configured otherwise.
pub const DEFAULT_PARTITIONS: u32 = 3;

/// Core trait for message log implementations.
///
/// A log is a set of topics, each split into partitions. Messages with the
/// same key always land in the same partition, so they are delivered in the
/// order they were appended. Delivery is at-least-once: a fetched message is
/// handed out again until its consumer group commits it.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Appends a message to the partition selected by `key`.
    ///
    /// Returns the stored message with its partition and offset assigned.
    async fn append(
        &self,
        topic: &str,
        key: &str,
        payload: Vec<u8>,
        headers: Headers,
    ) -> Result<Message>;

    /// Returns the next uncommitted message for `group`, waiting until one exists.
    ///
    /// The message returned is the lowest uncommitted offset of some partition
    /// that has one. Partitions are scanned starting after the one `group`
    /// last committed on, wrapping around. Fetching does not advance the
    /// group's position; only [`commit`](Self::commit) does.
    async fn fetch(&self, topic: &str, group: &str) -> Result<Message>;

    /// Marks `message` (and everything before it in its partition) as
    /// processed by `group`.
    async fn commit(&self, group: &str, message: &Message) -> Result<()>;
}

#[async_trait]
impl<T: MessageLog + ?Sized> MessageLog for Arc<T> {
    async fn append(
        &self,
        topic: &str,
        key: &str,
        payload: Vec<u8>,
        headers: Headers,
    ) -> Result<Message> {
        (**self).append(topic, key, payload, headers).await
    }

    async fn fetch(&self, topic: &str, group: &str) -> Result<Message> {
        (**self).fetch(topic, group).await
    }

    async fn commit(&self, group: &str, message: &Message) -> Result<()> {
        (**self).commit(group, message).await
    }
}
