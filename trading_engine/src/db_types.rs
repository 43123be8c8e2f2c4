//! Database record types for the trading engine.
//!
//! These are the rows the engine reads and writes. They are public so that front ends (HTTP server, tooling)
//! can use them directly, but mutation only ever happens through the engine APIs.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use ue_common::Rupees;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------      OrderSide      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "Buy"),
            OrderSide::Sell => write!(f, "Sell"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            s => Err(ConversionError(format!("Invalid order side: {s}"))),
        }
    }
}

//--------------------------------------      OrderType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at the prevailing reference price, captured at intake.
    Market,
    /// Execute at the given limit price or better.
    Limit,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "Market"),
            OrderType::Limit => write!(f, "Limit"),
        }
    }
}

impl FromStr for OrderType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "market" => Ok(Self::Market),
            "limit" => Ok(Self::Limit),
            s => Err(ConversionError(format!("Invalid order type: {s}"))),
        }
    }
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Newly created. No fills yet.
    Pending,
    /// At least one fill, but unfilled quantity remains.
    Partial,
    /// Fully filled. Terminal.
    Completed,
    /// Cancelled by the user or an admin. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Open orders rest in the book and may still be matched or cancelled.
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Partial)
    }

    /// The status implied by the fill counters for a live (non-cancelled) order.
    pub fn from_fill(filled_quantity: i64, quantity: i64) -> Self {
        if filled_quantity >= quantity {
            OrderStatus::Completed
        } else if filled_quantity > 0 {
            OrderStatus::Partial
        } else {
            OrderStatus::Pending
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Partial => write!(f, "Partial"),
            OrderStatus::Completed => write!(f, "Completed"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Partial" => Ok(Self::Partial),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    pub company_id: i64,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: i64,
    /// The limit price for limit orders; the execution reference price captured at intake for market orders.
    pub price: Rupees,
    /// `price × quantity`. For buy orders this is the amount reserved from the wallet at intake.
    pub total_amount: Rupees,
    pub status: OrderStatus,
    pub filled_quantity: i64,
    pub filled_amount: Rupees,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn remaining(&self) -> i64 {
        self.quantity - self.filled_quantity
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open() && self.remaining() > 0
    }
}

//--------------------------------------       NewOrder      ---------------------------------------------------------
/// An order request as it arrives from the front end, before validation and intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: String,
    pub company_id: i64,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: i64,
    /// Required iff `order_type` is `Limit`.
    pub limit_price: Option<Rupees>,
}

impl NewOrder {
    pub fn limit(user_id: impl Into<String>, company_id: i64, side: OrderSide, quantity: i64, price: Rupees) -> Self {
        Self {
            user_id: user_id.into(),
            company_id,
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(price),
        }
    }

    pub fn market(user_id: impl Into<String>, company_id: i64, side: OrderSide, quantity: i64) -> Self {
        Self { user_id: user_id.into(), company_id, side, order_type: OrderType::Market, quantity, limit_price: None }
    }
}

//--------------------------------------        Trade        ---------------------------------------------------------
/// A single bilateral execution. Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub buy_order_id: i64,
    pub sell_order_id: i64,
    pub buyer_id: String,
    pub seller_id: String,
    pub company_id: i64,
    pub quantity: i64,
    pub price: Rupees,
    pub total_amount: Rupees,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Position       ---------------------------------------------------------
/// A user's holding in one company. The row is deleted when `quantity` reaches zero.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Position {
    pub user_id: String,
    pub company_id: i64,
    pub quantity: i64,
    /// Shares committed to open sell orders. Always `<= quantity`.
    pub reserved_quantity: i64,
    /// Weighted-average cost basis per share, in paise. Unchanged by sells.
    pub average_price: Rupees,
    pub total_invested: Rupees,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Shares still available to commit to a new sell order.
    pub fn sellable(&self) -> i64 {
        self.quantity - self.reserved_quantity
    }
}

//--------------------------------------       Company       ---------------------------------------------------------
/// Reference data for a tradeable pre-IPO company. The engine only ever writes back `current_price`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub active: bool,
    pub available_shares: i64,
    /// The last traded price, or the listing reference price before any trade has happened.
    pub current_price: Rupees,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub symbol: String,
    pub active: bool,
    pub available_shares: i64,
    pub current_price: Rupees,
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub kyc_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_from_fill_counters() {
        assert_eq!(OrderStatus::from_fill(0, 10), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_fill(4, 10), OrderStatus::Partial);
        assert_eq!(OrderStatus::from_fill(10, 10), OrderStatus::Completed);
    }

    #[test]
    fn round_trip_enums() {
        for s in ["Pending", "Partial", "Completed", "Cancelled"] {
            assert_eq!(s.parse::<OrderStatus>().unwrap().to_string(), s);
        }
        assert_eq!("BUY".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert_eq!("limit".parse::<OrderType>().unwrap(), OrderType::Limit);
        assert!("hold".parse::<OrderSide>().is_err());
    }
}
