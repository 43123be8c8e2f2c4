use std::{fmt::Debug, sync::Arc};

use dashmap::DashMap;
use log::*;
use tokio::sync::Mutex;

use crate::{
    db_types::{NewOrder, Order, OrderType},
    events::{EventProducers, OrderCancelledEvent, OrderPlacedEvent, TradeExecutedEvent},
    order_objects::OrderQueryFilter,
    traits::{ExchangeDatabase, OrderFlowError, OrderOutcome},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: placement (with its synchronous matching
/// pass), cancellation and order queries.
///
/// It layers two things over the storage backend:
/// * a per-company lock, so that only one matching pass (or cancellation) is ever in flight against a
///   company's book — two concurrent passes could otherwise both claim the same resting order;
/// * the event hooks, notified after the backend transaction has committed.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    company_locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            producers: self.producers.clone(),
            company_locks: Arc::clone(&self.company_locks),
        }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, company_locks: Arc::new(DashMap::new()) }
    }

    fn lock_for_company(&self, company_id: i64) -> Arc<Mutex<()>> {
        self.company_locks.entry(company_id).or_default().value().clone()
    }
}

impl<B> OrderFlowApi<B>
where B: ExchangeDatabase
{
    /// Submit a new order.
    ///
    /// The request is validated, the buyer's funds (or seller's shares) are reserved, the order is
    /// persisted and the book for the company is matched — all inside one backend transaction held under
    /// the company lock. The returned outcome carries the order with its immediate fill status and any
    /// trades the pass produced. A rejected order has no observable side effects.
    pub async fn place_order(&self, order: NewOrder) -> Result<OrderOutcome, OrderFlowError> {
        validate_order_request(&order)?;
        let lock = self.lock_for_company(order.company_id);
        let outcome = {
            let _guard = lock.lock().await;
            self.db.process_new_order(order).await?
        };
        debug!(
            "🔄️📦️ Order #{} placed: {} with {} trade(s)",
            outcome.order.id,
            outcome.order.status,
            outcome.trades.len()
        );
        self.call_order_placed_hook(&outcome.order).await;
        self.call_trade_executed_hook(&outcome).await;
        Ok(outcome)
    }

    /// Cancel an open order belonging to `user_id`, refunding the unfilled part of its reservation.
    ///
    /// Runs under the same company lock as matching, and the backend re-checks the order state inside its
    /// transaction, so a cancel racing a matching pass can never produce a duplicate refund.
    pub async fn cancel_order(&self, user_id: &str, order_id: i64) -> Result<Order, OrderFlowError> {
        let company_id = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .map(|o| o.company_id)
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let lock = self.lock_for_company(company_id);
        let order = {
            let _guard = lock.lock().await;
            self.db.cancel_order(user_id, order_id).await?
        };
        debug!("🔄️❌️ Order #{order_id} cancelled");
        for producer in &self.producers.order_cancelled_producer {
            producer.publish_event(OrderCancelledEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    /// The user's orders, optionally narrowed by the filter. The `user_id` constraint always applies.
    pub async fn list_orders(&self, user_id: &str, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        self.db.search_orders(filter.with_user_id(user_id)).await
    }

    async fn call_order_placed_hook(&self, order: &Order) {
        for producer in &self.producers.order_placed_producer {
            producer.publish_event(OrderPlacedEvent::new(order.clone())).await;
        }
    }

    async fn call_trade_executed_hook(&self, outcome: &OrderOutcome) {
        for producer in &self.producers.trade_executed_producer {
            for trade in &outcome.trades {
                producer.publish_event(TradeExecutedEvent::new(trade.clone())).await;
            }
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Static request checks; anything that needs storage state happens in the backend transaction.
fn validate_order_request(order: &NewOrder) -> Result<(), OrderFlowError> {
    if order.quantity < 1 {
        return Err(OrderFlowError::Validation(format!("Order quantity must be at least 1, got {}", order.quantity)));
    }
    match (order.order_type, order.limit_price) {
        (OrderType::Limit, None) => {
            Err(OrderFlowError::Validation("A limit order requires a limit price".to_string()))
        },
        (OrderType::Limit, Some(p)) if p.value() <= 0 => {
            Err(OrderFlowError::Validation(format!("Limit price must be positive, got {p}")))
        },
        (OrderType::Market, Some(_)) => {
            Err(OrderFlowError::Validation("A market order must not carry a limit price".to_string()))
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use ue_common::Rupees;

    use super::*;
    use crate::db_types::OrderSide;

    #[test]
    fn rejects_malformed_requests() {
        let order = NewOrder::limit("alice", 1, OrderSide::Buy, 0, Rupees::from_rupees(100));
        assert!(matches!(validate_order_request(&order), Err(OrderFlowError::Validation(_))));

        let mut order = NewOrder::market("alice", 1, OrderSide::Buy, 10);
        order.limit_price = Some(Rupees::from_rupees(100));
        assert!(matches!(validate_order_request(&order), Err(OrderFlowError::Validation(_))));

        let mut order = NewOrder::limit("alice", 1, OrderSide::Sell, 10, Rupees::from_rupees(100));
        order.limit_price = None;
        assert!(matches!(validate_order_request(&order), Err(OrderFlowError::Validation(_))));

        let order = NewOrder::limit("alice", 1, OrderSide::Sell, 10, Rupees::from(0));
        assert!(matches!(validate_order_request(&order), Err(OrderFlowError::Validation(_))));
    }

    #[test]
    fn accepts_well_formed_requests() {
        let order = NewOrder::limit("alice", 1, OrderSide::Buy, 10, Rupees::from_rupees(100));
        assert!(validate_order_request(&order).is_ok());
        let order = NewOrder::market("bob", 2, OrderSide::Sell, 5);
        assert!(validate_order_request(&order).is_ok());
    }
}
