//! Inventory service trait and in-process ledger implementation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use common::ItemId;
use domain::StockLevel;
use stock_ledger::StockLedger;

use super::ServiceError;

/// Trait for per-item stock reservation.
///
/// `Ok` means the units moved. The returned level is informational: a
/// service that confirms the move without a readable level returns `None`.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Reserves `quantity` units of one item.
    async fn reserve(
        &self,
        item_id: &ItemId,
        quantity: u32,
    ) -> Result<Option<StockLevel>, ServiceError>;

    /// Releases `quantity` previously reserved units of one item.
    async fn release(
        &self,
        item_id: &ItemId,
        quantity: u32,
    ) -> Result<Option<StockLevel>, ServiceError>;
}

/// Inventory service that calls a [`StockLedger`] in-process.
///
/// Carries switches that simulate an unreachable inventory service, so the
/// saga's handling of infrastructure failures can be exercised.
#[derive(Clone)]
pub struct LedgerInventoryService<L: StockLedger> {
    ledger: L,
    unreachable_items: Arc<Mutex<HashSet<ItemId>>>,
    fail_on_release: Arc<AtomicBool>,
}

impl<L: StockLedger> LedgerInventoryService<L> {
    /// Creates a new inventory service over the given ledger.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            unreachable_items: Arc::default(),
            fail_on_release: Arc::default(),
        }
    }

    /// Returns a reference to the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Makes reservations of `item_id` fail with a transport error.
    pub fn set_unreachable_on_reserve(&self, item_id: impl Into<ItemId>) {
        self.unreachable_items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item_id.into());
    }

    /// Configures every release to fail with a transport error.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.fail_on_release.store(fail, Ordering::SeqCst);
    }

    fn is_unreachable(&self, item_id: &ItemId) -> bool {
        self.unreachable_items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(item_id)
    }
}

#[async_trait]
impl<L: StockLedger> InventoryService for LedgerInventoryService<L> {
    async fn reserve(
        &self,
        item_id: &ItemId,
        quantity: u32,
    ) -> Result<Option<StockLevel>, ServiceError> {
        if self.is_unreachable(item_id) {
            return Err(ServiceError::Transport(
                "inventory service unreachable".to_string(),
            ));
        }
        Ok(Some(self.ledger.reserve(item_id, quantity).await?))
    }

    async fn release(
        &self,
        item_id: &ItemId,
        quantity: u32,
    ) -> Result<Option<StockLevel>, ServiceError> {
        if self.fail_on_release.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport(
                "inventory service unreachable".to_string(),
            ));
        }
        Ok(Some(self.ledger.release(item_id, quantity).await?))
    }
}
