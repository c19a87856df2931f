//! Storage backends selected from configuration.

use std::sync::Arc;

use common::ItemId;
use domain::{InMemoryOrderRepository, PostgresOrderRepository};
use messaging::{InMemoryMessageLog, PostgresMessageLog};
use sqlx::postgres::PgPoolOptions;
use stock_ledger::{InMemoryStockLedger, LedgerError, PostgresStockLedger, StockLedger};

use crate::config::Config;
use crate::state::{SharedLedger, SharedLog, SharedOrders};

const MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// The stock ledger, order store and message log the process runs on.
#[derive(Clone)]
pub struct Backends {
    pub ledger: SharedLedger,
    pub orders: SharedOrders,
    pub log: SharedLog,
}

impl Backends {
    /// Process-local backends; nothing survives a restart.
    pub fn in_memory() -> Self {
        Self {
            ledger: Arc::new(InMemoryStockLedger::new()),
            orders: Arc::new(InMemoryOrderRepository::new()),
            log: Arc::new(InMemoryMessageLog::new()),
        }
    }

    /// PostgreSQL backends sharing one pool, with migrations applied.
    pub async fn postgres(database_url: &str) -> Result<Self, BackendError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        // One migration set covers the ledger, the orders and the message log.
        let ledger = PostgresStockLedger::new(pool.clone());
        ledger.run_migrations().await?;
        let orders = PostgresOrderRepository::new(pool.clone());
        let log = PostgresMessageLog::new(pool);

        Ok(Self {
            ledger: Arc::new(ledger),
            orders: Arc::new(orders),
            log: Arc::new(log),
        })
    }

    /// Picks PostgreSQL when `DATABASE_URL` is set, in-memory otherwise.
    pub async fn from_config(config: &Config) -> Result<Self, BackendError> {
        match &config.database_url {
            Some(url) => {
                tracing::info!("using PostgreSQL backends");
                Self::postgres(url).await
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory backends");
                Ok(Self::in_memory())
            }
        }
    }

    /// Provisions every seed item the ledger does not know yet.
    ///
    /// Existing items keep their counters so restarts never reset stock.
    pub async fn seed(&self, stock: &[(ItemId, i64)]) -> Result<usize, BackendError> {
        let mut provisioned = 0;

        for (item_id, available) in stock {
            match self.ledger.get(item_id).await {
                Ok(_) => continue,
                Err(LedgerError::NotFound(_)) => {
                    self.ledger.provision(item_id, *available).await?;
                    tracing::info!(%item_id, available, "stock provisioned");
                    provisioned += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(provisioned)
    }
}
