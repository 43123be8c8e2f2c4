use serde::{Deserialize, Serialize};
use trading_engine::{
    db_types::{NewOrder, OrderSide, OrderStatus, OrderType},
    order_objects::OrderQueryFilter,
};
use ue_common::Rupees;

/// The request body for `POST /api/orders`. The user id comes from the `X-User-Id` header, never the
/// body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub company_id: i64,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: i64,
    /// The limit price. Required for LIMIT orders and forbidden for MARKET orders.
    #[serde(default)]
    pub price: Option<Rupees>,
}

impl PlaceOrderRequest {
    pub fn into_new_order(self, user_id: &str) -> NewOrder {
        NewOrder {
            user_id: user_id.to_string(),
            company_id: self.company_id,
            side: self.side,
            order_type: self.order_type,
            quantity: self.quantity,
            limit_price: self.price,
        }
    }
}

/// Query parameters for `GET /api/orders`. The user constraint is always applied from the header;
/// these only narrow the result further.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSearchQuery {
    pub company_id: Option<i64>,
    pub side: Option<OrderSide>,
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub open_only: bool,
}

impl From<OrderSearchQuery> for OrderQueryFilter {
    fn from(q: OrderSearchQuery) -> Self {
        let mut filter = OrderQueryFilter::default();
        if let Some(company_id) = q.company_id {
            filter = filter.with_company_id(company_id);
        }
        if let Some(side) = q.side {
            filter = filter.with_side(side);
        }
        if let Some(status) = q.status {
            filter = filter.with_status(status);
        }
        if q.open_only {
            filter = filter.open_only();
        }
        filter
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAmountRequest {
    pub amount: Rupees,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBalanceResult {
    pub user_id: String,
    pub balance: Rupees,
}

