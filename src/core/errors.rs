//! Error taxonomy for the matching core.

use uuid::Uuid;

/// Failure from one of the four external ports (order store, trade store,
/// balance port). Kept separate from `MatchingError` so port implementations
/// don't need to know about the engine's other failure modes.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("order store failure during {operation}: {source}")]
    OrderStore {
        operation: &'static str,
        source: String,
    },
    #[error("trade store failure during {operation}: {source}")]
    TradeStore {
        operation: &'static str,
        source: String,
    },
    #[error("balance port failure adjusting {user_id}: {source}")]
    BalancePort { user_id: String, source: String },
}

/// Top-level engine error.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    /// Malformed input: missing price on LIMIT, non-positive quantity,
    /// unknown side/kind, empty symbol.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Cancel or lookup for an unknown order id.
    #[error("order not found: {0}")]
    NotFound(Uuid),

    /// Cancel request from a user that does not own the order.
    #[error("user {user_id} does not own order {order_id}")]
    Authorization { user_id: String, order_id: Uuid },

    /// Order/trade store or balance port failure. Fatal for the call that
    /// produced it; the engine does not leave partial trades visible.
    #[error("persistence error for order {order_id}: {source}")]
    Persistence {
        order_id: Uuid,
        #[source]
        source: PersistenceError,
    },

    /// An invariant that should be impossible under correct lock discipline
    /// was violated. Always a programming error, never a user-facing one.
    #[error("concurrency invariant violated: {0}")]
    Concurrency(String),
}

impl MatchingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        MatchingError::Validation(msg.into())
    }
}
