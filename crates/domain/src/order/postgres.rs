use std::collections::HashMap;

use async_trait::async_trait;
use common::{CustomerId, OrderId};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{Money, Order, OrderItem, OrderRepository, OrderStatus};
use crate::error::DomainError;

const ORDER_COLUMNS: &str = "id, customer_id, status, total, created_at";

/// PostgreSQL-backed order repository.
///
/// An order row and its item rows are written in one transaction. Items keep
/// their placement order through a `position` column.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_order(row: &PgRow) -> Result<Order, DomainError> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::new(row.try_get::<String, _>("id")?),
            customer_id: CustomerId::new(row.try_get::<String, _>("customer_id")?),
            items: Vec::new(),
            total: Money::from_cents(row.try_get("total")?),
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem, DomainError> {
        let quantity: i64 = row.try_get("quantity")?;
        Ok(OrderItem::new(
            row.try_get::<String, _>("item_id")?,
            u32::try_from(quantity).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            Money::from_cents(row.try_get("price")?),
        ))
    }

    /// Attaches the stored items to each order.
    async fn with_items(&self, mut orders: Vec<Order>) -> Result<Vec<Order>, DomainError> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<String> = orders.iter().map(|o| o.id.to_string()).collect();
        let rows = sqlx::query(
            r#"
            SELECT order_id, item_id, quantity, price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let order_id: String = row.try_get("order_id")?;
            items
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }

        for order in &mut orders {
            order.items = items.remove(order.id.as_str()).unwrap_or_default();
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, total, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.customer_id.as_str())
        .bind(order.status.as_str())
        .bind(order.total.cents())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DomainError::DuplicateOrder(order.id.clone());
            }
            DomainError::Database(e)
        })?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, item_id, quantity, price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id.as_str())
            .bind(position as i32)
            .bind(item.item_id.as_str())
            .bind(i64::from(item.quantity))
            .bind(item.price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let order = Self::row_to_order(&row)?;
                Ok(self.with_items(vec![order]).await?.pop())
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Order>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>, _>>()?;
        self.with_items(orders).await
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let order = Self::row_to_order(&row)?;
                Ok(self.with_items(vec![order]).await?.pop())
            }
            None => Ok(None),
        }
    }
}
