use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ledger::{
    StockLedger, record_release, record_reservation, validate_available, validate_quantity,
};
use crate::{ItemId, LedgerError, Result, StockLevel};

/// In-memory stock ledger.
///
/// Each reserve/release holds the write guard for the whole check-and-update,
/// which gives the same atomicity as the conditional UPDATE of the PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryStockLedger {
    items: Arc<RwLock<BTreeMap<ItemId, StockLevel>>>,
}

impl InMemoryStockLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger seeded with `(item_id, available)` pairs.
    pub fn with_stock<I, S>(stock: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<ItemId>,
    {
        let items = stock
            .into_iter()
            .map(|(id, available)| {
                let id = id.into();
                (id.clone(), StockLevel::new(id, available))
            })
            .collect();
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Returns the number of items in the ledger.
    pub async fn item_count(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn reserve(&self, item_id: &ItemId, quantity: u32) -> Result<StockLevel> {
        let quantity = validate_quantity(quantity)?;

        let result = {
            let mut items = self.items.write().await;
            match items.get_mut(item_id) {
                None => Err(LedgerError::NotFound(item_id.clone())),
                Some(level) if !level.can_reserve(quantity) => {
                    Err(LedgerError::InsufficientStock {
                        item_id: item_id.clone(),
                        requested: quantity,
                    })
                }
                Some(level) => {
                    level.available -= quantity;
                    level.reserved += quantity;
                    Ok(level.clone())
                }
            }
        };

        record_reservation(item_id, quantity, &result);
        result
    }

    async fn release(&self, item_id: &ItemId, quantity: u32) -> Result<StockLevel> {
        let quantity = validate_quantity(quantity)?;

        let result = {
            let mut items = self.items.write().await;
            match items.get_mut(item_id) {
                Some(level) if level.can_release(quantity) => {
                    level.available += quantity;
                    level.reserved -= quantity;
                    Ok(level.clone())
                }
                _ => Err(LedgerError::InsufficientReservedStock {
                    item_id: item_id.clone(),
                    requested: quantity,
                }),
            }
        };

        record_release(item_id, quantity, &result);
        result
    }

    async fn get(&self, item_id: &ItemId) -> Result<StockLevel> {
        self.items
            .read()
            .await
            .get(item_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(item_id.clone()))
    }

    async fn list(&self) -> Result<Vec<StockLevel>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn provision(&self, item_id: &ItemId, available: i64) -> Result<StockLevel> {
        let available = validate_available(available)?;
        let level = StockLevel::new(item_id.clone(), available);
        self.items
            .write()
            .await
            .insert(item_id.clone(), level.clone());
        Ok(level)
    }
}
