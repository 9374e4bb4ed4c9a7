//! A continuous-auction matching engine for a multi-symbol spot market:
//! price-time priority, maker-price execution, exact decimal arithmetic,
//! and per-symbol lock partitioning for cross-symbol parallelism.

pub mod config;
pub mod core;
pub mod memory;

pub use crate::core::{
    BalancePort, Clock, ExecutionReport, MatchingEngine, MatchingError, Order, OrderBook,
    OrderBookManager, OrderBookSnapshot, OrderStatus, OrderStore, OrderType, PersistenceError,
    PriceLevelView, RestError, Side, Trade, TradeStore,
};
