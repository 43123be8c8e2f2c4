//! Unlisted Edge Trading Engine
//!
//! The core of the Unlisted Edge platform for trading pre-IPO company shares: order intake and validation,
//! price-time priority matching, atomic settlement and order lifecycle management. It is front-end
//! agnostic; the HTTP server is a separate crate.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`] behind the [`traits`] contracts). SQLite is the
//!    supported backend. You should never need to access the database directly; use the public engine API
//!    instead. The exception is the record types in [`db_types`], which are public.
//! 2. The matching planner ([`matching`]): the pure price-time priority algorithm, kept free of storage
//!    concerns so it can be tested in isolation. The backend runs it inside the intake transaction.
//! 3. The engine public API ([`OrderFlowApi`]): order placement, cancellation and queries, serialized per
//!    company so only one matching pass is ever in flight against a book.
//!
//! The engine also emits events ([`events`]) when orders are placed or cancelled and when trades execute.
//! A simple hook framework lets collaborators subscribe without touching engine state.

pub mod db_types;
pub mod events;
pub mod matching;
mod order_flow;
mod sqlite;
pub mod traits;

pub use order_flow::{order_objects, OrderFlowApi};
pub use sqlite::{create_database_if_missing, db_url, SqliteDatabase};
pub use traits::{ExchangeDatabase, MarketQuery, OrderFlowError, OrderOutcome};
