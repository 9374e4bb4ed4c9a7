//! The matching core: data model, ports, the per-symbol book, the
//! per-symbol lock manager, and the matching engine itself.

pub mod engine;
pub mod errors;
pub mod manager;
pub mod orderbook;
pub mod ports;
pub mod types;

pub use engine::MatchingEngine;
pub use errors::{MatchingError, PersistenceError};
pub use manager::OrderBookManager;
pub use orderbook::{OrderBook, RestError};
pub use ports::{BalancePort, Clock, OrderStore, TradeStore};
pub use types::{
    ExecutionReport, Order, OrderBookSnapshot, OrderStatus, OrderType, PriceLevelView, Side, Trade,
};
