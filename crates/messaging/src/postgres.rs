use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tokio::sync::Mutex;

use crate::log::{DEFAULT_PARTITIONS, MessageLog};
use crate::{Headers, Message, Result, partition_for};

/// How often a waiting fetch re-queries the log.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// PostgreSQL-backed message log.
///
/// Messages live in the `messages` table keyed by `(topic, partition, offset)`;
/// committed positions live in `consumer_offsets`. Appends to one partition
/// are serialized with a transaction-scoped advisory lock so offsets stay
/// dense and strictly increasing.
///
/// Fetch order rotates across partitions per consumer group: after a commit
/// on partition `p`, the next fetch of that group looks at `p + 1` first.
/// The rotation position is kept per process.
#[derive(Clone)]
pub struct PostgresMessageLog {
    pool: PgPool,
    partitions: u32,
    poll_interval: Duration,
    cursors: Arc<Mutex<HashMap<(String, String), i32>>>,
}

impl PostgresMessageLog {
    /// Creates a new PostgreSQL message log.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            partitions: DEFAULT_PARTITIONS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cursors: Arc::default(),
        }
    }

    /// Sets the number of partitions per topic.
    ///
    /// Must stay the same for the lifetime of a topic, or keys will move
    /// between partitions.
    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    /// Sets how often a waiting fetch polls for new messages.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_message(row: PgRow) -> Result<Message> {
        let headers_json: serde_json::Value = row.try_get("headers")?;
        let headers: Headers = serde_json::from_value(headers_json)?;

        Ok(Message {
            topic: row.try_get("topic")?,
            partition: row.try_get("partition")?,
            offset: row.try_get("offset")?,
            key: row.try_get("key")?,
            payload: row.try_get("payload")?,
            headers,
            timestamp: row.try_get("created_at")?,
        })
    }

    async fn next_uncommitted(&self, topic: &str, group: &str) -> Result<Option<Message>> {
        let start = self
            .cursors
            .lock()
            .await
            .get(&(group.to_string(), topic.to_string()))
            .copied()
            .unwrap_or(0);

        let row = sqlx::query(
            r#"
            SELECT m.topic, m.partition, m."offset", m.key, m.payload, m.headers, m.created_at
            FROM messages m
            LEFT JOIN consumer_offsets c
                ON c.group_id = $2 AND c.topic = m.topic AND c.partition = m.partition
            WHERE m.topic = $1 AND m."offset" >= COALESCE(c."offset", 0)
            ORDER BY (m.partition >= $3) DESC, m.partition ASC, m."offset" ASC
            LIMIT 1
            "#,
        )
        .bind(topic)
        .bind(group)
        .bind(start)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_message).transpose()
    }
}

#[async_trait]
impl MessageLog for PostgresMessageLog {
    async fn append(
        &self,
        topic: &str,
        key: &str,
        payload: Vec<u8>,
        headers: Headers,
    ) -> Result<Message> {
        let partition = partition_for(key, self.partitions);
        let headers_json = serde_json::to_value(&headers)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), $2)")
            .bind(topic)
            .bind(partition)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(
            r#"
            INSERT INTO messages (topic, partition, "offset", key, payload, headers)
            SELECT $1, $2, COALESCE(MAX("offset") + 1, 0), $3, $4, $5
            FROM messages
            WHERE topic = $1 AND partition = $2
            RETURNING topic, partition, "offset", key, payload, headers, created_at
            "#,
        )
        .bind(topic)
        .bind(partition)
        .bind(key)
        .bind(&payload)
        .bind(headers_json)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Self::row_to_message(row)
    }

    async fn fetch(&self, topic: &str, group: &str) -> Result<Message> {
        loop {
            if let Some(message) = self.next_uncommitted(topic, group).await? {
                return Ok(message);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn commit(&self, group: &str, message: &Message) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO consumer_offsets (group_id, topic, partition, "offset")
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (group_id, topic, partition)
            DO UPDATE SET "offset" = GREATEST(consumer_offsets."offset", EXCLUDED."offset"),
                          updated_at = NOW()
            "#,
        )
        .bind(group)
        .bind(&message.topic)
        .bind(message.partition)
        .bind(message.offset + 1)
        .execute(&self.pool)
        .await?;

        self.cursors.lock().await.insert(
            (group.to_string(), message.topic.clone()),
            (message.partition + 1) % self.partitions as i32,
        );
        Ok(())
    }
}
