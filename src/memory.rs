//! In-process reference implementations of `core::ports`.
//!
//! These back this crate's own tests and the demo binary. They are not a
//! durable storage format — a real deployment swaps each of these for a
//! database-backed, ledger-backed, or append-only-log-backed adapter behind
//! the same trait.

use std::collections::HashMap;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::errors::PersistenceError;
use crate::core::ports::{BalancePort, Clock, OrderStore, TradeStore};
use crate::core::types::{Order, Trade};

/// Keeps the latest known state of every order ever saved.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<Uuid, Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn save(&self, order: &Order) -> Result<(), PersistenceError> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, PersistenceError> {
        Ok(self.orders.get(&id).map(|entry| entry.clone()))
    }
}

/// Append-only log of every trade ever saved.
#[derive(Default)]
pub struct InMemoryTradeStore {
    trades: Mutex<Vec<Trade>>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Trade> {
        self.trades.lock().clone()
    }
}

impl TradeStore for InMemoryTradeStore {
    fn save(&self, trade: &Trade) -> Result<(), PersistenceError> {
        self.trades.lock().push(trade.clone());
        Ok(())
    }
}

/// Per-user cash balance, starting at zero for any user seen for the first
/// time. `adjust` is one lock acquisition, so each call is atomic.
#[derive(Default)]
pub struct InMemoryBalancePort {
    balances: Mutex<HashMap<String, Decimal>>,
}

impl InMemoryBalancePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, user_id: &str) -> Decimal {
        self.balances
            .lock()
            .get(user_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Seed a starting balance, for tests and the demo binary.
    pub fn credit(&self, user_id: &str, amount: Decimal) {
        *self.balances.lock().entry(user_id.to_string()).or_default() += amount;
    }
}

impl BalancePort for InMemoryBalancePort {
    fn adjust(&self, user_id: &str, delta: Decimal) -> Result<(), PersistenceError> {
        *self.balances.lock().entry(user_id.to_string()).or_default() += delta;
        Ok(())
    }
}

/// Wall-clock time source.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OrderType, Side};
    use rust_decimal_macros::dec;

    #[test]
    fn order_store_round_trips_latest_state() {
        let store = InMemoryOrderStore::new();
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
        store.save(&order).unwrap();
        let found = store.find_by_id(order.id).unwrap().unwrap();
        assert_eq!(found.id, order.id);
    }

    #[test]
    fn balance_port_adjust_is_cumulative() {
        let balances = InMemoryBalancePort::new();
        balances.adjust("alice", dec!(100)).unwrap();
        balances.adjust("alice", dec!(-40)).unwrap();
        assert_eq!(balances.balance_of("alice"), dec!(60));
    }

    #[test]
    fn trade_store_appends_in_order() {
        let store = InMemoryTradeStore::new();
        for i in 0..3 {
            store
                .save(&Trade {
                    id: Uuid::new_v4(),
                    buy_order_id: Uuid::new_v4(),
                    sell_order_id: Uuid::new_v4(),
                    price: dec!(100),
                    quantity: dec!(1),
                    timestamp: i,
                })
                .unwrap();
        }
        let all = store.all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].timestamp, 2);
    }
}
