use thiserror::Error;

/// Error type returned by message handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when producing or consuming messages.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The handler failed to process a message; the message was not committed.
    #[error("Handler failed on {topic}/{partition}@{offset}: {source}")]
    Handler {
        topic: String,
        partition: i32,
        offset: i64,
        #[source]
        source: HandlerError,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;
