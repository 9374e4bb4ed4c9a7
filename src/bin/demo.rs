//! Demonstration binary: wires tracing, configuration, the in-memory port
//! adapters, and the matching engine together, then drives a handful of
//! representative orders (a simple cross, a partial fill, walking the book,
//! and a market order) so the engine's behavior is visible end to end.

use std::sync::Arc;

use rust_decimal_macros::dec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use matching_engine::config::EngineConfig;
use matching_engine::core::types::{Order, OrderType, Side};
use matching_engine::memory::{InMemoryBalancePort, InMemoryOrderStore, InMemoryTradeStore, SystemClock};
use matching_engine::{MatchingEngine, OrderBookManager};

fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = EngineConfig::load()?;
    init_tracing(&config);
    tracing::info!(symbols = ?config.symbols, "starting matching engine demo");

    let manager = Arc::new(OrderBookManager::new());
    let order_store = Arc::new(InMemoryOrderStore::new());
    let trade_store = Arc::new(InMemoryTradeStore::new());
    let balances = Arc::new(InMemoryBalancePort::new());
    balances.credit("alice", dec!(100_000));
    balances.credit("bob", dec!(100_000));
    balances.credit("carol", dec!(100_000));

    let engine = MatchingEngine::new(
        manager,
        order_store.clone(),
        trade_store.clone(),
        balances.clone(),
        Arc::new(SystemClock),
    );

    let symbol = config.symbols.first().cloned().unwrap_or_else(|| "BTCUSD".to_string());

    let ask = Order::new(
        Uuid::new_v4(),
        "alice",
        &symbol,
        Side::Sell,
        OrderType::Limit,
        Some(dec!(100.00)),
        dec!(5),
        1,
    );
    engine.execute_order(ask)?;

    let bid = Order::new(
        Uuid::new_v4(),
        "bob",
        &symbol,
        Side::Buy,
        OrderType::Limit,
        Some(dec!(101.00)),
        dec!(2),
        2,
    );
    let report = engine.execute_order(bid)?;
    tracing::info!(?report, "bob's order processed");

    let snapshot = engine.snapshot(&symbol).truncated(config.snapshot_depth);
    tracing::info!(?snapshot, "book after bob's order");

    let market_sell = Order::new(
        Uuid::new_v4(),
        "carol",
        &symbol,
        Side::Sell,
        OrderType::Market,
        None,
        dec!(10),
        3,
    );
    let report = engine.execute_order(market_sell)?;
    tracing::info!(?report, "carol's market order processed (residual dropped, not rested)");

    tracing::info!(
        alice = %balances.balance_of("alice"),
        bob = %balances.balance_of("bob"),
        carol = %balances.balance_of("carol"),
        "final balances"
    );

    Ok(())
}
