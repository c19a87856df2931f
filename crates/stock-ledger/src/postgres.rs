use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::ledger::{
    StockLedger, record_release, record_reservation, validate_available, validate_quantity,
};
use crate::{ItemId, LedgerError, Result, StockLevel};

/// PostgreSQL-backed stock ledger.
///
/// Reserve and release are each one `UPDATE ... WHERE <guard> RETURNING`
/// statement, so the row lock taken by PostgreSQL is the only serialization
/// point between concurrent callers.
#[derive(Clone)]
pub struct PostgresStockLedger {
    pool: PgPool,
}

impl PostgresStockLedger {
    /// Creates a new PostgreSQL stock ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
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

    fn row_to_level(row: PgRow) -> Result<StockLevel> {
        Ok(StockLevel {
            item_id: ItemId::new(row.try_get::<String, _>("item_id")?),
            available: row.try_get("available")?,
            reserved: row.try_get("reserved")?,
        })
    }

    async fn exists(&self, item_id: &ItemId) -> Result<bool> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM items WHERE item_id = $1")
            .bind(item_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl StockLedger for PostgresStockLedger {
    async fn reserve(&self, item_id: &ItemId, quantity: u32) -> Result<StockLevel> {
        let quantity = validate_quantity(quantity)?;

        let row = sqlx::query(
            r#"
            UPDATE items
            SET available = available - $2, reserved = reserved + $2, updated_at = NOW()
            WHERE item_id = $1 AND available >= $2
            RETURNING item_id, available, reserved
            "#,
        )
        .bind(item_id.as_str())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await;

        let result = match row {
            Ok(Some(row)) => Self::row_to_level(row),
            // The guard rejected the update; find out whether the item exists at all.
            Ok(None) => match self.exists(item_id).await {
                Ok(true) => Err(LedgerError::InsufficientStock {
                    item_id: item_id.clone(),
                    requested: quantity,
                }),
                Ok(false) => Err(LedgerError::NotFound(item_id.clone())),
                Err(e) => Err(e),
            },
            Err(e) => Err(e.into()),
        };

        record_reservation(item_id, quantity, &result);
        result
    }

    async fn release(&self, item_id: &ItemId, quantity: u32) -> Result<StockLevel> {
        let quantity = validate_quantity(quantity)?;

        let row = sqlx::query(
            r#"
            UPDATE items
            SET available = available + $2, reserved = reserved - $2, updated_at = NOW()
            WHERE item_id = $1 AND reserved >= $2
            RETURNING item_id, available, reserved
            "#,
        )
        .bind(item_id.as_str())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await;

        let result = match row {
            Ok(Some(row)) => Self::row_to_level(row),
            Ok(None) => Err(LedgerError::InsufficientReservedStock {
                item_id: item_id.clone(),
                requested: quantity,
            }),
            Err(e) => Err(e.into()),
        };

        record_release(item_id, quantity, &result);
        result
    }

    async fn get(&self, item_id: &ItemId) -> Result<StockLevel> {
        let row = sqlx::query(
            r#"
            SELECT item_id, available, reserved
            FROM items
            WHERE item_id = $1
            "#,
        )
        .bind(item_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_level(row),
            None => Err(LedgerError::NotFound(item_id.clone())),
        }
    }

    async fn list(&self) -> Result<Vec<StockLevel>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, available, reserved
            FROM items
            ORDER BY item_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_level).collect()
    }

    async fn provision(&self, item_id: &ItemId, available: i64) -> Result<StockLevel> {
        let available = validate_available(available)?;

        let row = sqlx::query(
            r#"
            INSERT INTO items (item_id, available, reserved)
            VALUES ($1, $2, 0)
            ON CONFLICT (item_id)
            DO UPDATE SET available = EXCLUDED.available, reserved = 0, updated_at = NOW()
            RETURNING item_id, available, reserved
            "#,
        )
        .bind(item_id.as_str())
        .bind(available)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_level(row)
    }
}
