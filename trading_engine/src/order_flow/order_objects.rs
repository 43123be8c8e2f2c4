use serde::{Deserialize, Serialize};

use crate::db_types::{OrderSide, OrderStatus};

/// Search criteria for order queries. An empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub user_id: Option<String>,
    pub company_id: Option<i64>,
    pub side: Option<OrderSide>,
    pub statuses: Vec<OrderStatus>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_company_id(mut self, company_id: i64) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn with_side(mut self, side: OrderSide) -> Self {
        self.side = Some(side);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Only orders that still rest in the book.
    pub fn open_only(self) -> Self {
        self.with_status(OrderStatus::Pending).with_status(OrderStatus::Partial)
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.company_id.is_none() && self.side.is_none() && self.statuses.is_empty()
    }
}
