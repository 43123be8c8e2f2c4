use thiserror::Error;
use ue_common::Rupees;

use crate::db_types::{ConversionError, OrderStatus};

/// The error taxonomy for the order lifecycle.
///
/// `Concurrency` is transient: the caller may retry the whole operation. Everything else is a terminal
/// verdict on the request. A failed request has no observable side effects; the owning transaction is
/// rolled back in full.
#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("Invalid order request. {0}")]
    Validation(String),
    #[error("KYC verification is required before trading")]
    KycRequired,
    #[error("Insufficient funds: order requires {required}, wallet holds {available}")]
    InsufficientFunds { required: Rupees, available: Rupees },
    #[error("Insufficient holdings: order requires {required} shares, {available} are sellable")]
    InsufficientHoldings { required: i64, available: i64 },
    #[error("User {0} does not exist")]
    UserNotFound(String),
    #[error("Company {0} does not exist")]
    CompanyNotFound(i64),
    #[error("Company {0} is not open for trading")]
    CompanyInactive(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {id} cannot be modified in its current state ({status})")]
    InvalidState { id: i64, status: OrderStatus },
    #[error("No reference price is available for a market order on company {0}")]
    NoReferencePrice(i64),
    #[error("The operation conflicted with a concurrent transaction and can be retried. {0}")]
    Concurrency(String),
    #[error("Storage failure: {0}")]
    Database(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => {
                // SQLITE_BUSY (5) and SQLITE_LOCKED (6) are lock conflicts, not data errors.
                let code = db.code().unwrap_or_default();
                if code == "5" || code == "6" || db.message().contains("database is locked") {
                    OrderFlowError::Concurrency(db.message().to_string())
                } else {
                    OrderFlowError::Database(e.to_string())
                }
            },
            sqlx::Error::PoolTimedOut => OrderFlowError::Concurrency(e.to_string()),
            _ => OrderFlowError::Database(e.to_string()),
        }
    }
}

impl From<ConversionError> for OrderFlowError {
    fn from(e: ConversionError) -> Self {
        OrderFlowError::Validation(e.to_string())
    }
}

impl OrderFlowError {
    /// True for errors where retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, OrderFlowError::Concurrency(_))
    }
}
