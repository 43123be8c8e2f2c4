use ue_common::Rupees;

use crate::{
    db_types::{Company, Order, Position, Trade},
    order_objects::OrderQueryFilter,
    traits::OrderFlowError,
};

/// Read-only access to market and account state.
///
/// These queries are also consumed outside the core (portfolio summary views, company listings), so they
/// live on their own trait rather than on [`super::ExchangeDatabase`].
#[allow(async_fn_in_trait)]
pub trait MarketQuery {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Fetch orders matching the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;

    async fn fetch_company(&self, company_id: i64) -> Result<Option<Company>, OrderFlowError>;

    async fn list_companies(&self) -> Result<Vec<Company>, OrderFlowError>;

    async fn trades_for_company(&self, company_id: i64) -> Result<Vec<Trade>, OrderFlowError>;

    /// Every trade in which the order participated, on either side.
    async fn trades_for_order(&self, order_id: i64) -> Result<Vec<Trade>, OrderFlowError>;

    async fn position(&self, user_id: &str, company_id: i64) -> Result<Option<Position>, OrderFlowError>;

    async fn positions_for_user(&self, user_id: &str) -> Result<Vec<Position>, OrderFlowError>;

    /// The user's wallet balance. A user without a wallet row has a zero balance.
    async fn wallet_balance(&self, user_id: &str) -> Result<Rupees, OrderFlowError>;

    async fn is_kyc_verified(&self, user_id: &str) -> Result<bool, OrderFlowError>;
}
