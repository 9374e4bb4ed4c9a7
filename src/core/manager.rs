//! Per-symbol lock partitioning.
//!
//! One `RwLock<OrderBook>` per symbol, created lazily the first time that
//! symbol is touched. Cross-symbol operations proceed in parallel; all
//! mutation of a single symbol's book serializes through its lock.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use super::orderbook::OrderBook;
use super::types::OrderBookSnapshot;

#[derive(Default)]
pub struct OrderBookManager {
    books: DashMap<String, Arc<RwLock<OrderBook>>>,
}

impl OrderBookManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock guarding `symbol`'s book, creating an empty one on
    /// first use. Race-free: `DashMap::entry` holds its shard lock across
    /// the check-then-insert.
    pub fn book_for(&self, symbol: &str) -> Arc<RwLock<OrderBook>> {
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(OrderBook::new())))
            .clone()
    }

    /// A read-locked snapshot of `symbol`'s book, or an empty one if the
    /// symbol has never been touched. Never creates a book entry for a
    /// symbol it hasn't seen, unlike `book_for`.
    pub fn snapshot(&self, symbol: &str) -> OrderBookSnapshot {
        match self.books.get(symbol) {
            Some(book) => book.read().snapshot(),
            None => OrderBookSnapshot::default(),
        }
    }

    /// Symbols with at least one resting order, for diagnostics/demo use.
    pub fn active_symbols(&self) -> Vec<String> {
        self.books
            .iter()
            .filter(|entry| !entry.value().read().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Order, OrderType, Side};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn snapshot_of_untouched_symbol_is_empty() {
        let manager = OrderBookManager::new();
        let snap = manager.snapshot("BTCUSD");
        assert!(snap.bids.is_empty());
        assert!(snap.asks.is_empty());
    }

    #[test]
    fn book_for_is_stable_across_calls() {
        let manager = OrderBookManager::new();
        let a = manager.book_for("BTCUSD");
        let order = Order::new(
            Uuid::new_v4(),
            "alice",
            "BTCUSD",
            Side::Buy,
            OrderType::Limit,
            Some(dec!(100)),
            dec!(1),
            1,
        );
        a.write().add_bid(order).unwrap();

        let b = manager.book_for("BTCUSD");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.snapshot("BTCUSD").bids.len(), 1);
    }

    #[test]
    fn distinct_symbols_get_distinct_books() {
        let manager = OrderBookManager::new();
        let btc = manager.book_for("BTCUSD");
        let eth = manager.book_for("ETHUSD");
        assert!(!Arc::ptr_eq(&btc, &eth));
    }
}
