use std::sync::Arc;

use async_trait::async_trait;

use crate::{ItemId, LedgerError, Result, StockLevel};

/// Core trait for stock ledger implementations.
///
/// All implementations must be thread-safe (Send + Sync) and must perform each
/// reserve/release as one atomic check-and-update: a read followed by a
/// separate write would let two concurrent reservations oversell an item.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Reserves `quantity` units of an item.
    ///
    /// Succeeds only if `available >= quantity` at the moment of the update,
    /// moving the units from `available` to `reserved`. Fails with
    /// `InsufficientStock` or `NotFound` otherwise.
    ///
    /// Returns the stock level after the reservation.
    async fn reserve(&self, item_id: &ItemId, quantity: u32) -> Result<StockLevel>;

    /// Releases `quantity` previously reserved units back to `available`.
    ///
    /// Fails with `InsufficientReservedStock` if fewer units are reserved,
    /// including when the item does not exist.
    async fn release(&self, item_id: &ItemId, quantity: u32) -> Result<StockLevel>;

    /// Gets the current stock level of an item.
    async fn get(&self, item_id: &ItemId) -> Result<StockLevel>;

    /// Lists all stock levels ordered by item ID.
    async fn list(&self) -> Result<Vec<StockLevel>>;

    /// Creates or resets an item with `available` units and nothing reserved.
    ///
    /// Used for seeding; never called by the fulfillment saga.
    async fn provision(&self, item_id: &ItemId, available: i64) -> Result<StockLevel>;
}

#[async_trait]
impl<T: StockLedger + ?Sized> StockLedger for Arc<T> {
    async fn reserve(&self, item_id: &ItemId, quantity: u32) -> Result<StockLevel> {
        (**self).reserve(item_id, quantity).await
    }

    async fn release(&self, item_id: &ItemId, quantity: u32) -> Result<StockLevel> {
        (**self).release(item_id, quantity).await
    }

    async fn get(&self, item_id: &ItemId) -> Result<StockLevel> {
        (**self).get(item_id).await
    }

    async fn list(&self) -> Result<Vec<StockLevel>> {
        (**self).list().await
    }

    async fn provision(&self, item_id: &ItemId, available: i64) -> Result<StockLevel> {
        (**self).provision(item_id, available).await
    }
}

/// Validates a reserve/release quantity, widening it to the ledger's counter type.
pub(crate) fn validate_quantity(quantity: u32) -> Result<i64> {
    if quantity == 0 {
        return Err(LedgerError::InvalidQuantity { quantity: 0 });
    }
    Ok(i64::from(quantity))
}

/// Validates a provisioned stock count.
pub(crate) fn validate_available(available: i64) -> Result<i64> {
    if available < 0 {
        return Err(LedgerError::InvalidQuantity {
            quantity: available,
        });
    }
    Ok(available)
}

/// Records metrics and logs for the outcome of a reservation.
pub(crate) fn record_reservation(item_id: &ItemId, quantity: i64, result: &Result<StockLevel>) {
    match result {
        Ok(level) => {
            metrics::counter!("stock_reservations_total").increment(1);
            tracing::debug!(%item_id, quantity, available = level.available, "stock reserved");
        }
        Err(e) if e.is_rejection() => {
            metrics::counter!("stock_reservations_rejected").increment(1);
            tracing::info!(%item_id, quantity, reason = %e, "stock reservation rejected");
        }
        Err(e) => {
            tracing::error!(%item_id, quantity, error = %e, "stock reservation failed");
        }
    }
}

/// Records metrics and logs for the outcome of a release.
pub(crate) fn record_release(item_id: &ItemId, quantity: i64, result: &Result<StockLevel>) {
    match result {
        Ok(level) => {
            metrics::counter!("stock_releases_total").increment(1);
            tracing::debug!(%item_id, quantity, available = level.available, "stock released");
        }
        Err(e) => {
            tracing::warn!(%item_id, quantity, error = %e, "stock release failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_quantity_is_invalid() {
        assert!(matches!(
            validate_quantity(0),
            Err(LedgerError::InvalidQuantity { quantity: 0 })
        ));
        assert_eq!(validate_quantity(7).unwrap(), 7);
    }

    #[test]
    fn test_negative_available_is_invalid() {
        assert!(validate_available(-1).is_err());
        assert_eq!(validate_available(0).unwrap(), 0);
    }

    #[test]
    fn test_rejections_are_not_infrastructure_errors() {
        let item = ItemId::new("ITEM-001");
        assert!(
            LedgerError::InsufficientStock {
                item_id: item.clone(),
                requested: 1
            }
            .is_rejection()
        );
        assert!(LedgerError::NotFound(item).is_rejection());
        assert!(!LedgerError::Database(sqlx::Error::PoolTimedOut).is_rejection());
    }
}
