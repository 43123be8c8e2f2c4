use serde::{Deserialize, Serialize};
use ue_common::Rupees;

use crate::{
    db_types::{Company, NewCompany, NewOrder, Order, Trade, User},
    traits::{MarketQuery, OrderFlowError},
};

/// The result of an order intake: the persisted order (reflecting any synchronous fills) and the trades the
/// matching pass produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
}

/// The mutation contract a storage backend must fulfil to drive the trading engine.
///
/// The backend owns transactionality: `process_new_order` runs validation, reservation, order insertion and
/// the full matching-and-settlement pass for the company inside **one** transaction, and `cancel_order`
/// re-checks the order state inside its own transaction. Serializing passes per company is the caller's job
/// (see [`crate::OrderFlowApi`]), which holds a per-company lock across each call.
#[allow(async_fn_in_trait)]
pub trait ExchangeDatabase: Clone + MarketQuery {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Validate and persist a new order, then run the matching pass for its company.
    ///
    /// Checks, in order, each aborting with no mutation: the user exists and is KYC-verified; the company
    /// exists and is active; a market order can resolve an execution reference price (last trade, falling
    /// back to the company reference price); the buyer's wallet covers `price × quantity`, or the seller
    /// holds enough unreserved shares. Funds are debited (buy) or shares reserved (sell) before the order
    /// row is written, so a second concurrent order cannot double-commit the same resource.
    async fn process_new_order(&self, order: NewOrder) -> Result<OrderOutcome, OrderFlowError>;

    /// Cancel an open (`Pending` or `Partial`) order belonging to `user_id`.
    ///
    /// Refunds the unfilled part of the reservation: `price × (quantity − filled_quantity)` back to a
    /// buyer's wallet, or the same number of shares released from a seller's reserved holdings. The status
    /// check happens inside the transaction, so a cancel racing a matching pass on the same company (both
    /// serialized by the company lock) can never refund quantity that was just filled.
    async fn cancel_order(&self, user_id: &str, order_id: i64) -> Result<Order, OrderFlowError>;

    /// Create or update a user record, along with its (empty) wallet row. Collaborator surface: user
    /// provisioning itself is handled by the auth service.
    async fn upsert_user(&self, user_id: &str, display_name: &str) -> Result<User, OrderFlowError>;

    /// Flip the KYC gate for a user. Consulted by `process_new_order` before any other check.
    async fn set_kyc_verified(&self, user_id: &str, verified: bool) -> Result<(), OrderFlowError>;

    /// Create or update (by symbol) a company reference-data record.
    async fn upsert_company(&self, company: NewCompany) -> Result<Company, OrderFlowError>;

    /// Credit shares to a user's portfolio at the given cost basis per share. This is the transfer-in
    /// surface used by off-platform share allocations; it follows the same weighted-average cost-basis
    /// arithmetic as a buy fill.
    async fn grant_shares(
        &self,
        user_id: &str,
        company_id: i64,
        quantity: i64,
        cost_basis: Rupees,
    ) -> Result<(), OrderFlowError>;

    /// Credit a user's wallet. `amount` must be positive.
    async fn deposit(&self, user_id: &str, amount: Rupees) -> Result<Rupees, OrderFlowError>;

    /// Debit a user's wallet. Fails with `InsufficientFunds` rather than ever going negative.
    async fn withdraw(&self, user_id: &str, amount: Rupees) -> Result<Rupees, OrderFlowError>;
}
