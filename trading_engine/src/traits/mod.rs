//! Backend contracts for the trading engine.
//!
//! The engine's public APIs are generic over these traits so that the storage backend can be swapped out
//! without touching the order flow logic.
//!
//! * [`ExchangeDatabase`] covers every mutation: order intake with its synchronous matching pass,
//!   cancellation, and the collaborator surface (users, companies, wallet deposits/withdrawals).
//! * [`MarketQuery`] covers the read side: orders, trades, positions, balances and company reference data.

mod errors;
mod exchange_database;
mod market_query;

pub use errors::OrderFlowError;
pub use exchange_database::{ExchangeDatabase, OrderOutcome};
pub use market_query::MarketQuery;
