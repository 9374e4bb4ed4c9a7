//! The per-symbol priced FIFO structure.
//!
//! `OrderBook` knows nothing about matching policy, users, or persistence —
//! only how to keep two price-ordered ladders of resting orders with FIFO
//! queues per level. The matching loop lives in `crate::core::engine`.

use std::collections::{BTreeMap, HashMap, VecDeque};

use rust_decimal::Decimal;
use uuid::Uuid;

use super::types::{Order, OrderBookSnapshot, OrderStatus, PriceLevelView, Side};

/// Error returned by `add_bid`/`add_ask` when an order cannot be rested:
/// either its side contradicts the ladder being inserted into, or it carries
/// no price to key a ladder level by.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RestError {
    #[error("order {0} does not belong on that side of the book")]
    WrongSide(Uuid),
    #[error("order {0} has no price and cannot rest in a ladder")]
    MissingPrice(Uuid),
}

#[derive(Default)]
pub struct OrderBook {
    /// Keyed by price; iterate `.iter().rev()` for descending (best bid
    /// first).
    bids: BTreeMap<Decimal, VecDeque<Order>>,
    /// Keyed by price; iterate `.iter()` for ascending (best ask first).
    asks: BTreeMap<Decimal, VecDeque<Order>>,
    /// Order id -> (ladder, price level), for O(level size) removal by
    /// identity.
    index: HashMap<Uuid, (Side, Decimal)>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Append a resting BUY order at `order.price`.
    pub fn add_bid(&mut self, order: Order) -> Result<(), RestError> {
        if order.side != Side::Buy {
            return Err(RestError::WrongSide(order.id));
        }
        self.insert(Side::Buy, order)
    }

    /// Append a resting SELL order at `order.price`.
    pub fn add_ask(&mut self, order: Order) -> Result<(), RestError> {
        if order.side != Side::Sell {
            return Err(RestError::WrongSide(order.id));
        }
        self.insert(Side::Sell, order)
    }

    fn insert(&mut self, side: Side, order: Order) -> Result<(), RestError> {
        let price = order.price.ok_or(RestError::MissingPrice(order.id))?;
        let id = order.id;
        let ladder = self.ladder_mut(side);
        ladder.entry(price).or_default().push_back(order);
        self.index.insert(id, (side, price));
        Ok(())
    }

    fn ladder_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, VecDeque<Order>> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Head of the best-priced queue on `side`'s ladder (pure peek). Used
    /// both by the public `best_bid`/`best_ask` peeks and by the matching
    /// engine to inspect the maker's price/remaining quantity before
    /// deciding how much of it to fill.
    pub(crate) fn peek_best(&self, side: Side) -> Option<&Order> {
        match side {
            Side::Buy => self.bids.iter().next_back().and_then(|(_, q)| q.front()),
            Side::Sell => self.asks.iter().next().and_then(|(_, q)| q.front()),
        }
    }

    /// Head of the highest-priced bid queue, or none if empty.
    pub fn best_bid(&self) -> Option<&Order> {
        self.peek_best(Side::Buy)
    }

    /// Head of the lowest-priced ask queue, or none if empty.
    pub fn best_ask(&self) -> Option<&Order> {
        self.peek_best(Side::Sell)
    }

    /// Apply a fill of `trade_qty` to the current head of `side`'s best
    /// level. The caller (the matching engine) has already decided
    /// `trade_qty = min(aggressor.remaining, maker.remaining)`; this method
    /// only maintains the ladder/index/FIFO invariants and returns the
    /// maker order's state *after* the fill, removing it from the book if
    /// it is now fully filled.
    ///
    /// Panics if there is no resting order on `side` — callers must check
    /// `best_price`/`peek_best` first.
    pub(crate) fn apply_fill_to_best(&mut self, side: Side, trade_qty: Decimal) -> Order {
        let ladder = self.ladder_mut(side);
        let price = match side {
            Side::Buy => *ladder.keys().next_back().expect("caller checked a resting order exists"),
            Side::Sell => *ladder.keys().next().expect("caller checked a resting order exists"),
        };
        let queue = ladder.get_mut(&price).expect("price level present");
        let maker = queue.front_mut().expect("queue non-empty");
        maker.filled_quantity += trade_qty;
        maker.status = if maker.is_fully_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };

        if maker.is_fully_filled() {
            let filled = queue.pop_front().expect("front just matched");
            self.index.remove(&filled.id);
            if queue.is_empty() {
                ladder.remove(&price);
            }
            filled
        } else {
            maker.clone()
        }
    }

    /// Remove a specific order by identity. No-op if absent.
    pub fn remove(&mut self, order_id: Uuid) -> Option<Order> {
        let (side, price) = self.index.remove(&order_id)?;
        let ladder = self.ladder_mut(side);
        let queue = ladder.get_mut(&price)?;
        let pos = queue.iter().position(|o| o.id == order_id)?;
        let order = queue.remove(pos);
        if queue.is_empty() {
            ladder.remove(&price);
        }
        order
    }

    /// Aggregated view of both ladders: bids descending, asks ascending.
    pub fn snapshot(&self) -> OrderBookSnapshot {
        let bids = self
            .bids
            .iter()
            .rev()
            .map(|(price, queue)| level_view(*price, queue))
            .collect();
        let asks = self
            .asks
            .iter()
            .map(|(price, queue)| level_view(*price, queue))
            .collect();
        OrderBookSnapshot { bids, asks }
    }
}

fn level_view(price: Decimal, queue: &VecDeque<Order>) -> PriceLevelView {
    let remaining_quantity = queue.iter().map(Order::remaining).sum();
    PriceLevelView {
        price,
        remaining_quantity,
        order_count: queue.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::OrderType;
    use rust_decimal_macros::dec;

    fn order(side: Side, price: Decimal, qty: Decimal, created_at: i64) -> Order {
        Order::new(
            Uuid::new_v4(),
            "user",
            "BTCUSD",
            side,
            OrderType::Limit,
            Some(price),
            qty,
            created_at,
        )
    }

    #[test]
    fn add_bid_rejects_sell_order() {
        let mut book = OrderBook::new();
        let ask = order(Side::Sell, dec!(100), dec!(1), 1);
        assert!(book.add_bid(ask).is_err());
    }

    #[test]
    fn best_bid_and_ask_track_extremes() {
        let mut book = OrderBook::new();
        book.add_bid(order(Side::Buy, dec!(99), dec!(1), 1)).unwrap();
        book.add_bid(order(Side::Buy, dec!(101), dec!(1), 2)).unwrap();
        book.add_ask(order(Side::Sell, dec!(103), dec!(1), 3)).unwrap();
        book.add_ask(order(Side::Sell, dec!(102), dec!(1), 4)).unwrap();

        assert_eq!(book.best_bid().unwrap().price, Some(dec!(101)));
        assert_eq!(book.best_ask().unwrap().price, Some(dec!(102)));
    }

    #[test]
    fn fifo_within_level_is_preserved() {
        let mut book = OrderBook::new();
        let first = order(Side::Sell, dec!(100), dec!(2), 1);
        let second = order(Side::Sell, dec!(100), dec!(3), 2);
        let first_id = first.id;
        book.add_ask(first).unwrap();
        book.add_ask(second).unwrap();

        assert_eq!(book.best_ask().unwrap().id, first_id);
    }

    #[test]
    fn apply_fill_removes_level_when_exhausted() {
        let mut book = OrderBook::new();
        book.add_ask(order(Side::Sell, dec!(100), dec!(2), 1)).unwrap();
        let maker = book.apply_fill_to_best(Side::Sell, dec!(2));
        assert_eq!(maker.status, OrderStatus::Filled);
        assert!(book.best_ask().is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn apply_fill_leaves_partial_resting() {
        let mut book = OrderBook::new();
        book.add_ask(order(Side::Sell, dec!(100), dec!(5), 1)).unwrap();
        let maker = book.apply_fill_to_best(Side::Sell, dec!(2));
        assert_eq!(maker.status, OrderStatus::PartiallyFilled);
        assert_eq!(book.best_ask().unwrap().remaining(), dec!(3));
    }

    #[test]
    fn remove_drops_empty_level() {
        let mut book = OrderBook::new();
        let o = order(Side::Buy, dec!(50), dec!(1), 1);
        let id = o.id;
        book.add_bid(o).unwrap();
        assert!(book.remove(id).is_some());
        assert!(book.is_empty());
        assert!(book.remove(id).is_none());
    }

    #[test]
    fn snapshot_aggregates_remaining_quantity_per_level() {
        let mut book = OrderBook::new();
        book.add_bid(order(Side::Buy, dec!(100), dec!(1), 1)).unwrap();
        book.add_bid(order(Side::Buy, dec!(100), dec!(2), 2)).unwrap();
        book.add_ask(order(Side::Sell, dec!(102), dec!(1.5), 3)).unwrap();

        let snap = book.snapshot();
        assert_eq!(snap.bids.len(), 1);
        assert_eq!(snap.bids[0].remaining_quantity, dec!(3));
        assert_eq!(snap.bids[0].order_count, 2);
        assert_eq!(snap.asks[0].remaining_quantity, dec!(1.5));
    }
}
