//! # Unlisted Edge server
//! This module hosts the HTTP front end for the Unlisted Edge trading engine. It is responsible for:
//! Accepting order placement and cancellation requests, listing a trader's orders, portfolio and
//! wallet, and exposing the tradeable company catalogue.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/orders`: Place (POST), list (GET) and cancel (DELETE `/api/orders/{id}`) orders.
//! * `/api/companies`: The list of companies available for trading.
//! * `/api/portfolio`, `/api/wallet`: The calling user's holdings and balance.
//! * `/api/wallet/deposit`, `/api/wallet/withdraw`: Wallet funding operations.
//!
//! The authenticated user id is taken from the `X-User-Id` header. Authentication itself is
//! performed upstream; this server trusts the header.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
