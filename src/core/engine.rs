//! The matching policy itself: price-time priority, maker-price execution,
//! partial fills, and the LIMIT/MARKET admission and resting rules.
//! `OrderBook` supplies the ladder mechanics; this module supplies the loop,
//! the trade/settlement side effects, and persistence.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::errors::{MatchingError, PersistenceError};
use super::manager::OrderBookManager;
use super::ports::{BalancePort, Clock, OrderStore, TradeStore};
use super::types::{ExecutionReport, Order, OrderStatus, OrderType, Side, Trade};

/// Trade feed capacity for `subscribe_trades`. A slow subscriber drops old
/// trades rather than applying backpressure to the matching loop.
const TRADE_FEED_CAPACITY: usize = 4096;

pub struct MatchingEngine {
    manager: Arc<OrderBookManager>,
    order_store: Arc<dyn OrderStore>,
    trade_store: Arc<dyn TradeStore>,
    balances: Arc<dyn BalancePort>,
    clock: Arc<dyn Clock>,
    trade_feed: broadcast::Sender<Trade>,
}

impl MatchingEngine {
    pub fn new(
        manager: Arc<OrderBookManager>,
        order_store: Arc<dyn OrderStore>,
        trade_store: Arc<dyn TradeStore>,
        balances: Arc<dyn BalancePort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (trade_feed, _) = broadcast::channel(TRADE_FEED_CAPACITY);
        Self {
            manager,
            order_store,
            trade_store,
            balances,
            clock,
            trade_feed,
        }
    }

    /// Observation seam for a surrounding system (e.g. a market-data
    /// broadcaster); the core itself never reads from this channel.
    pub fn subscribe_trades(&self) -> broadcast::Receiver<Trade> {
        self.trade_feed.subscribe()
    }

    pub fn snapshot(&self, symbol: &str) -> super::types::OrderBookSnapshot {
        self.manager.snapshot(symbol)
    }

    fn validate(&self, order: &Order) -> Result<(), MatchingError> {
        if order.symbol.trim().is_empty() {
            return Err(MatchingError::validation("symbol must not be empty"));
        }
        if order.quantity <= Decimal::ZERO {
            return Err(MatchingError::validation("quantity must be positive"));
        }
        match order.kind {
            OrderType::Limit => {
                let price = order
                    .price
                    .ok_or_else(|| MatchingError::validation("LIMIT order requires a price"))?;
                if price <= Decimal::ZERO {
                    return Err(MatchingError::validation("price must be positive"));
                }
            }
            OrderType::Market => {
                if order.price.is_some() {
                    return Err(MatchingError::validation(
                        "MARKET order must not carry a price",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Admit a new order, matching it against the opposite side of its
    /// symbol's book under that symbol's single write lock, then (if
    /// anything remains and the order is LIMIT) resting it.
    #[instrument(skip(self, order), fields(order_id = %order.id, symbol = %order.symbol, side = %order.side))]
    pub fn execute_order(&self, mut order: Order) -> Result<ExecutionReport, MatchingError> {
        self.validate(&order)?;

        let book_lock = self.manager.book_for(&order.symbol);
        let aggressor_side = order.side;
        let opposite = aggressor_side.opposite();
        let mut trades = Vec::new();

        // Matching and (if anything remains) resting happen under one
        // lock acquisition: a second order for this symbol must not be
        // able to interleave between this order's fill loop and its
        // insertion into the book.
        {
            let mut book = book_lock.write();
            while !order.is_fully_filled() {
                let Some(maker) = book.peek_best(opposite) else {
                    break;
                };
                let maker_price = maker.price.expect("resting order always has a price");

                if order.kind == OrderType::Limit {
                    let limit = order.price.expect("validated above");
                    let crosses = match aggressor_side {
                        Side::Buy => limit >= maker_price,
                        Side::Sell => limit <= maker_price,
                    };
                    if !crosses {
                        break;
                    }
                }

                let trade_qty = order.remaining().min(maker.remaining());
                let maker_id = maker.id;

                let maker_after = book.apply_fill_to_best(opposite, trade_qty);
                order.filled_quantity += trade_qty;

                let (buy_order_id, sell_order_id) = match aggressor_side {
                    Side::Buy => (order.id, maker_id),
                    Side::Sell => (maker_id, order.id),
                };
                let trade = Trade {
                    id: Uuid::new_v4(),
                    buy_order_id,
                    sell_order_id,
                    price: maker_price,
                    quantity: trade_qty,
                    timestamp: self.clock.now(),
                };

                self.settle(&order, &maker_after, &trade).map_err(|source| {
                    error!(order_id = %order.id, step = "settle", %source, "persistence failure");
                    MatchingError::Persistence {
                        order_id: order.id,
                        source,
                    }
                })?;

                debug!(
                    trade_id = %trade.id,
                    price = %trade.price,
                    quantity = %trade.quantity,
                    "matched"
                );
                let _ = self.trade_feed.send(trade.clone());
                metrics::counter!("matching_engine_trades_total").increment(1);
                trades.push(trade);
            }

            order.status = if order.is_fully_filled() {
                OrderStatus::Filled
            } else if !trades.is_empty() {
                OrderStatus::PartiallyFilled
            } else {
                OrderStatus::Pending
            };

            // MARKET orders never rest: any unfilled remainder is dropped,
            // not inserted into the book.
            if order.kind == OrderType::Limit && !order.is_fully_filled() {
                match aggressor_side {
                    Side::Buy => book.add_bid(order.clone()),
                    Side::Sell => book.add_ask(order.clone()),
                }
                .map_err(|_| {
                    MatchingError::Concurrency(format!(
                        "order {} carries the wrong side for its own book insertion",
                        order.id
                    ))
                })?;
            }
        }

        self.order_store.save(&order).map_err(|source| {
            error!(order_id = %order.id, step = "save_aggressor", %source, "persistence failure");
            MatchingError::Persistence {
                order_id: order.id,
                source,
            }
        })?;

        info!(
            status = %order.status,
            filled = %order.filled_quantity,
            trades = trades.len(),
            "order processed"
        );

        Ok(ExecutionReport::from_order(&order, trades))
    }

    /// Trade + order + balance side effects for one match. Any failure
    /// aborts `execute_order` before the caller observes a partial trade.
    fn settle(
        &self,
        aggressor: &Order,
        maker_after: &Order,
        trade: &Trade,
    ) -> Result<(), PersistenceError> {
        self.trade_store.save(trade)?;
        self.order_store.save(maker_after)?;

        let notional = trade.price * trade.quantity;
        let (buyer, seller) = match aggressor.side {
            Side::Buy => (&aggressor.user_id, &maker_after.user_id),
            Side::Sell => (&maker_after.user_id, &aggressor.user_id),
        };
        self.balances.adjust(buyer, -notional)?;
        self.balances.adjust(seller, notional)?;
        Ok(())
    }

    /// Cancel a resting order. Idempotent: cancelling an order already in a
    /// terminal state is a no-op, not an error.
    #[instrument(skip(self), fields(%order_id, %user_id))]
    pub fn cancel_order(
        &self,
        order_id: Uuid,
        symbol: &str,
        user_id: &str,
    ) -> Result<(), MatchingError> {
        let book_lock = self.manager.book_for(symbol);
        let mut order = {
            let mut book = book_lock.write();
            match book.remove(order_id) {
                Some(order) if order.user_id == user_id => order,
                Some(order) => {
                    // Wrong owner: put it back, the book must not mutate.
                    match order.side {
                        Side::Buy => book.add_bid(order),
                        Side::Sell => book.add_ask(order),
                    }
                    .ok();
                    return Err(MatchingError::Authorization {
                        user_id: user_id.to_string(),
                        order_id,
                    });
                }
                None => {
                    drop(book);
                    // Either never existed, already filled/cancelled, or on
                    // a different symbol than given — distinguish via the
                    // store.
                    return match self
                        .order_store
                        .find_by_id(order_id)
                        .map_err(|source| MatchingError::Persistence { order_id, source })?
                    {
                        Some(order) if order.status.is_terminal() => Ok(()),
                        Some(order) if order.user_id != user_id => {
                            Err(MatchingError::Authorization {
                                user_id: user_id.to_string(),
                                order_id,
                            })
                        }
                        Some(_) => Err(MatchingError::Concurrency(format!(
                            "order {order_id} is resting but missing from its symbol's book"
                        ))),
                        None => Err(MatchingError::NotFound(order_id)),
                    };
                }
            }
        };

        order.status = OrderStatus::Cancelled;
        self.order_store
            .save(&order)
            .map_err(|source| MatchingError::Persistence { order_id, source })?;
        warn!("order cancelled");
        Ok(())
    }
}
