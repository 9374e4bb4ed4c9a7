//! Core data model: orders, trades, and the DTOs the engine hands back to
//! callers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// LIMIT or MARKET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Limit => write!(f, "limit"),
            OrderType::Market => write!(f, "market"),
        }
    }
}

/// Order lifecycle status. Advances `Pending -> PartiallyFilled -> Filled`,
/// with `Cancelled` reachable from `Pending` or `PartiallyFilled` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::PartiallyFilled => write!(f, "partially_filled"),
            OrderStatus::Filled => write!(f, "filled"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A trading intent, resting or aggressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderType,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub status: OrderStatus,
    pub created_at: i64,
}

impl Order {
    /// `remaining = quantity - filled_quantity`.
    pub fn remaining(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    pub fn is_fully_filled(&self) -> bool {
        self.remaining() <= Decimal::ZERO
    }

    /// Construct a freshly-admitted order: `PENDING`, unfilled.
    ///
    /// Callers are expected to hand this a well-formed order: positive
    /// `quantity`, a positive `price` for `LIMIT`, none for `MARKET`.
    /// Callers normally reach this only after `MatchingEngine::execute_order`'s
    /// own validation, but it's exposed so admission layers can build
    /// well-formed orders directly.
    pub fn new(
        id: Uuid,
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        kind: OrderType,
        price: Option<Decimal>,
        quantity: Decimal,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            symbol: symbol.into(),
            side,
            kind,
            price,
            quantity,
            filled_quantity: Decimal::ZERO,
            status: OrderStatus::Pending,
            created_at,
        }
    }
}

/// A point-in-time match between a resting order and an aggressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub buy_order_id: Uuid,
    pub sell_order_id: Uuid,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: i64,
}

/// One aggregated price level in a book snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevelView {
    pub price: Decimal,
    pub remaining_quantity: Decimal,
    pub order_count: usize,
}

/// Aggregated view of one symbol's book at an instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// Descending by price.
    pub bids: Vec<PriceLevelView>,
    /// Ascending by price.
    pub asks: Vec<PriceLevelView>,
}

impl OrderBookSnapshot {
    /// Caps each side to its best `depth` levels (already ordered
    /// best-first per side). `depth == 0` leaves the snapshot unbounded.
    /// Used to apply `EngineConfig::snapshot_depth` at the presentation
    /// layer without changing what `OrderBook::snapshot`/`OrderBookManager::
    /// snapshot` themselves return.
    pub fn truncated(mut self, depth: usize) -> Self {
        if depth > 0 {
            self.bids.truncate(depth);
            self.asks.truncate(depth);
        }
        self
    }
}

/// Result of `MatchingEngine::execute_order`: the trades it produced plus
/// the aggressor's resulting fill state and volume-weighted average price.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub average_price: Option<Decimal>,
    pub trades: Vec<Trade>,
}

impl ExecutionReport {
    pub(crate) fn from_order(order: &Order, trades: Vec<Trade>) -> Self {
        let average_price = if trades.is_empty() {
            None
        } else {
            let (value, qty) = trades.iter().fold(
                (Decimal::ZERO, Decimal::ZERO),
                |(value, qty), t| (value + t.price * t.quantity, qty + t.quantity),
            );
            if qty > Decimal::ZERO {
                Some(value / qty)
            } else {
                None
            }
        };

        Self {
            order_id: order.id,
            status: order.status,
            filled_quantity: order.filled_quantity,
            remaining_quantity: order.remaining(),
            average_price,
            trades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn remaining_is_quantity_minus_filled() {
        let mut order = Order::new(
            Uuid::new_v4(),
            "alice",
            "BTCUSD",
            Side::Buy,
            OrderType::Limit,
            Some(dec!(100.00)),
            dec!(10.00),
            1,
        );
        assert_eq!(order.remaining(), dec!(10.00));
        order.filled_quantity = dec!(4.00);
        assert_eq!(order.remaining(), dec!(6.00));
        assert!(!order.is_fully_filled());
        order.filled_quantity = dec!(10.00);
        assert!(order.is_fully_filled());
    }

    #[test]
    fn average_price_is_volume_weighted() {
        let order = Order::new(
            Uuid::new_v4(),
            "bob",
            "BTCUSD",
            Side::Buy,
            OrderType::Limit,
            Some(dec!(101.00)),
            dec!(4.00),
            1,
        );
        let trades = vec![
            Trade {
                id: Uuid::new_v4(),
                buy_order_id: order.id,
                sell_order_id: Uuid::new_v4(),
                price: dec!(100.00),
                quantity: dec!(3.00),
                timestamp: 1,
            },
            Trade {
                id: Uuid::new_v4(),
                buy_order_id: order.id,
                sell_order_id: Uuid::new_v4(),
                price: dec!(101.00),
                quantity: dec!(1.00),
                timestamp: 2,
            },
        ];
        let report = ExecutionReport::from_order(&order, trades);
        // (100*3 + 101*1) / 4 = 401/4 = 100.25
        assert_eq!(report.average_price, Some(dec!(100.25)));
    }

    #[test]
    fn truncated_caps_each_side_independently() {
        let level = |p: Decimal| PriceLevelView {
            price: p,
            remaining_quantity: dec!(1),
            order_count: 1,
        };
        let snapshot = OrderBookSnapshot {
            bids: vec![level(dec!(100)), level(dec!(99)), level(dec!(98))],
            asks: vec![level(dec!(101))],
        };

        let capped = snapshot.clone().truncated(2);
        assert_eq!(capped.bids.len(), 2);
        assert_eq!(capped.asks.len(), 1);

        let unbounded = snapshot.truncated(0);
        assert_eq!(unbounded.bids.len(), 3);
    }
}
