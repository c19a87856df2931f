//! Stock ledger: per-item available/reserved counters with atomic,
//! oversell-proof reserve and release operations.
//!
//! Every mutation is a single conditional update, so concurrent callers on the
//! same item serialize inside the ledger without any application-level lock.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod postgres;

pub use common::ItemId;
pub use domain::StockLevel;
pub use error::{LedgerError, Result};
pub use ledger::StockLedger;
pub use memory::InMemoryStockLedger;
pub use postgres::PostgresStockLedger;
