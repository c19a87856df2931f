use thiserror::Error;

use crate::ItemId;

/// Errors that can occur when interacting with the stock ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Fewer units are available than were requested.
    #[error("Insufficient stock for item {item_id}: requested {requested}")]
    InsufficientStock { item_id: ItemId, requested: i64 },

    /// Fewer units are reserved than were asked to be released.
    #[error("Insufficient reserved stock to release for item {item_id}: requested {requested}")]
    InsufficientReservedStock { item_id: ItemId, requested: i64 },

    /// The item is not known to the ledger.
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// Quantities must be positive (stock counts non-negative).
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl LedgerError {
    /// Returns true for expected business rejections, as opposed to
    /// infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientStock { .. }
                | LedgerError::InsufficientReservedStock { .. }
                | LedgerError::NotFound(_)
                | LedgerError::InvalidQuantity { .. }
        )
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
