use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Trade};

/// Emitted once per accepted order, after its synchronous matching pass has committed. The order carries
/// the fill state as of commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order: Order,
}

impl OrderPlacedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted once per trade a matching pass produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeExecutedEvent {
    pub trade: Trade,
}

impl TradeExecutedEvent {
    pub fn new(trade: Trade) -> Self {
        Self { trade }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
}

impl OrderCancelledEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
