//! External collaborator contracts consumed by the core.
//!
//! The core never depends on a concrete storage engine or clock source —
//! only these traits. `crate::memory` provides in-process reference
//! implementations used by this crate's own tests and the demo binary;
//! a real deployment would back these with a database, an append-only log,
//! a ledger service, and a monotonic clock respectively.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::errors::PersistenceError;
use super::types::{Order, Trade};

/// Persists order state changes. The engine calls `save` after every
/// status or `filled_quantity` change.
pub trait OrderStore: Send + Sync {
    fn save(&self, order: &Order) -> Result<(), PersistenceError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, PersistenceError>;
}

/// Appends trade records. The engine calls `save` once per emitted trade.
pub trait TradeStore: Send + Sync {
    fn save(&self, trade: &Trade) -> Result<(), PersistenceError>;
}

/// Debits/credits user cash. `delta` is signed; implementations must apply
/// one call atomically — the engine relies on a single `adjust` never
/// observing a partial update.
pub trait BalancePort: Send + Sync {
    fn adjust(&self, user_id: &str, delta: Decimal) -> Result<(), PersistenceError>;
}

/// Supplies monotonic timestamps used for time priority and trade capture.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}
