use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Notify, RwLock};

use crate::log::{DEFAULT_PARTITIONS, MessageLog};
use crate::{Headers, Message, Result, partition_for};

#[derive(Default)]
struct LogState {
    /// topic -> partitions -> messages, index == offset
    topics: HashMap<String, Vec<Vec<Message>>>,
    /// (group, topic, partition) -> next offset to deliver
    committed: HashMap<(String, String, i32), i64>,
    /// (group, topic) -> partition the next fetch scans first
    cursors: HashMap<(String, String), usize>,
}

impl LogState {
    fn next_uncommitted(&self, topic: &str, group: &str) -> Option<Message> {
        let partitions = self.topics.get(topic)?;
        let count = partitions.len();
        let start = self
            .cursors
            .get(&(group.to_string(), topic.to_string()))
            .copied()
            .unwrap_or(0);

        (0..count).find_map(|step| {
            let partition = (start + step) % count;
            let key = (group.to_string(), topic.to_string(), partition as i32);
            let next = self.committed.get(&key).copied().unwrap_or(0);
            partitions[partition].get(next as usize).cloned()
        })
    }
}

/// In-memory message log for tests and single-process deployments.
///
/// Provides the same delivery semantics as the PostgreSQL implementation;
/// waiting fetchers are woken by appends instead of polling. After each
/// commit the group's next fetch starts scanning at the following partition,
/// so a busy partition cannot starve the others.
#[derive(Clone)]
pub struct InMemoryMessageLog {
    partitions: u32,
    state: Arc<RwLock<LogState>>,
    appended: Arc<Notify>,
}

impl Default for InMemoryMessageLog {
    fn default() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }
}

impl InMemoryMessageLog {
    /// Creates a new empty log with the default partition count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty log with `partitions` partitions per topic.
    pub fn with_partitions(partitions: u32) -> Self {
        Self {
            partitions: partitions.max(1),
            state: Arc::new(RwLock::new(LogState::default())),
            appended: Arc::new(Notify::new()),
        }
    }

    /// Returns the number of partitions per topic.
    pub fn partitions(&self) -> u32 {
        self.partitions
    }

    /// Returns the total number of messages stored for a topic.
    pub async fn message_count(&self, topic: &str) -> usize {
        self.state
            .read()
            .await
            .topics
            .get(topic)
            .map(|partitions| partitions.iter().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Returns the next offset `group` will receive from a partition.
    pub async fn committed_offset(&self, group: &str, topic: &str, partition: i32) -> i64 {
        self.state
            .read()
            .await
            .committed
            .get(&(group.to_string(), topic.to_string(), partition))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the number of messages `group` has not committed yet.
    pub async fn lag(&self, topic: &str, group: &str) -> usize {
        let state = self.state.read().await;
        let Some(partitions) = state.topics.get(topic) else {
            return 0;
        };
        partitions
            .iter()
            .enumerate()
            .map(|(partition, messages)| {
                let key = (group.to_string(), topic.to_string(), partition as i32);
                let next = state.committed.get(&key).copied().unwrap_or(0) as usize;
                messages.len().saturating_sub(next)
            })
            .sum()
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(
        &self,
        topic: &str,
        key: &str,
        payload: Vec<u8>,
        headers: Headers,
    ) -> Result<Message> {
        let partition = partition_for(key, self.partitions);

        let message = {
            let mut state = self.state.write().await;
            let partitions = state
                .topics
                .entry(topic.to_string())
                .or_insert_with(|| vec![Vec::new(); self.partitions as usize]);
            let messages = &mut partitions[partition as usize];

            let message = Message {
                topic: topic.to_string(),
                partition,
                offset: messages.len() as i64,
                key: key.to_string(),
                payload,
                headers,
                timestamp: Utc::now(),
            };
            messages.push(message.clone());
            message
        };

        self.appended.notify_waiters();
        Ok(message)
    }

    async fn fetch(&self, topic: &str, group: &str) -> Result<Message> {
        loop {
            // Register interest before checking, so an append that lands
            // between the check and the await still wakes us.
            let appended = self.appended.notified();
            tokio::pin!(appended);
            appended.as_mut().enable();

            if let Some(message) = self.state.read().await.next_uncommitted(topic, group) {
                return Ok(message);
            }

            appended.await;
        }
    }

    async fn commit(&self, group: &str, message: &Message) -> Result<()> {
        let key = (group.to_string(), message.topic.clone(), message.partition);
        let mut state = self.state.write().await;
        let next = state.committed.entry(key).or_insert(0);
        *next = (*next).max(message.offset + 1);
        state.cursors.insert(
            (group.to_string(), message.topic.clone()),
            (message.partition as usize + 1) % self.partitions as usize,
        );
        Ok(())
    }
}
