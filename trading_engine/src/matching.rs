//! Price-time priority matching.
//!
//! The planner is pure: it takes a snapshot of a company's open orders and returns the set of fills that
//! price-time priority produces. The storage backend is responsible for loading the book, running the planner
//! and settling every proposal inside a single transaction, so a pass commits or rolls back as a unit.
//!
//! Ranking is best price first, earliest submission second (order id breaks exact timestamp ties). A pair
//! crosses when `buy.price >= sell.price` and clears at the **sell order's price**, so any price improvement
//! accrues to the buyer.

use ue_common::Rupees;

use crate::db_types::{Order, OrderSide};

/// One fill proposed by the planner. Quantities were `min(buy.remaining, sell.remaining)` at plan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchProposal {
    pub buy_order_id: i64,
    pub sell_order_id: i64,
    pub buyer_id: String,
    pub seller_id: String,
    pub quantity: i64,
    /// Clearing price: the sell order's price.
    pub price: Rupees,
    /// The buy order's reservation price for this fill, needed to refund the buyer's price improvement.
    pub buy_price: Rupees,
}

impl MatchProposal {
    pub fn total_amount(&self) -> Rupees {
        self.price * self.quantity
    }
}

struct BookEntry<'a> {
    order: &'a Order,
    remaining: i64,
}

/// Compute all fills for the given book snapshot.
///
/// Orders that are not open (terminal status or nothing remaining) are ignored, as are pairs belonging to
/// the same user. The scan repeats until no crossing pair remains; since the snapshot is fixed for the
/// duration of a pass, walking buys in priority order against sells in priority order achieves exactly that.
pub fn plan_matches(book: &[Order]) -> Vec<MatchProposal> {
    let mut buys: Vec<BookEntry> = book
        .iter()
        .filter(|o| o.side == OrderSide::Buy && o.is_open())
        .map(|o| BookEntry { order: o, remaining: o.remaining() })
        .collect();
    let mut sells: Vec<BookEntry> = book
        .iter()
        .filter(|o| o.side == OrderSide::Sell && o.is_open())
        .map(|o| BookEntry { order: o, remaining: o.remaining() })
        .collect();

    // Bids: highest price first. Asks: lowest price first. Time, then id, breaks ties.
    buys.sort_by(|a, b| {
        b.order
            .price
            .cmp(&a.order.price)
            .then(a.order.created_at.cmp(&b.order.created_at))
            .then(a.order.id.cmp(&b.order.id))
    });
    sells.sort_by(|a, b| {
        a.order
            .price
            .cmp(&b.order.price)
            .then(a.order.created_at.cmp(&b.order.created_at))
            .then(a.order.id.cmp(&b.order.id))
    });

    let mut proposals = Vec::new();
    for buy in &mut buys {
        for sell in &mut sells {
            if buy.remaining == 0 {
                break;
            }
            if sell.order.price > buy.order.price {
                // Asks are sorted ascending, so nothing further can cross this bid.
                break;
            }
            if sell.remaining == 0 || sell.order.user_id == buy.order.user_id {
                continue;
            }
            let quantity = buy.remaining.min(sell.remaining);
            buy.remaining -= quantity;
            sell.remaining -= quantity;
            proposals.push(MatchProposal {
                buy_order_id: buy.order.id,
                sell_order_id: sell.order.id,
                buyer_id: buy.order.user_id.clone(),
                seller_id: sell.order.user_id.clone(),
                quantity,
                price: sell.order.price,
                buy_price: buy.order.price,
            });
        }
    }
    proposals
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db_types::{OrderStatus, OrderType};

    fn order(id: i64, user: &str, side: OrderSide, qty: i64, filled: i64, price_rs: i64, t_offset: i64) -> Order {
        let t = Utc::now() + Duration::seconds(t_offset);
        Order {
            id,
            user_id: user.to_string(),
            company_id: 1,
            side,
            order_type: OrderType::Limit,
            quantity: qty,
            price: Rupees::from_rupees(price_rs),
            total_amount: Rupees::from_rupees(price_rs) * qty,
            status: OrderStatus::from_fill(filled, qty),
            filled_quantity: filled,
            filled_amount: Rupees::from_rupees(price_rs) * filled,
            created_at: t,
            updated_at: t,
        }
    }

    #[test]
    fn no_cross_no_trades() {
        let book = vec![
            order(1, "alice", OrderSide::Buy, 10, 0, 90, 0),
            order(2, "bob", OrderSide::Sell, 10, 0, 95, 1),
        ];
        assert!(plan_matches(&book).is_empty());
    }

    #[test]
    fn clears_at_sell_price() {
        let book = vec![
            order(1, "alice", OrderSide::Buy, 10, 0, 100, 0),
            order(2, "bob", OrderSide::Sell, 10, 0, 95, 1),
        ];
        let fills = plan_matches(&book);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].quantity, 10);
        assert_eq!(fills[0].price, Rupees::from_rupees(95));
        assert_eq!(fills[0].buy_price, Rupees::from_rupees(100));
    }

    #[test]
    fn walks_asks_in_price_time_order() {
        // Scenario: one bid for 10 @ 100 against asks 6 @ 98 (earlier) and 5 @ 99.
        let book = vec![
            order(1, "s1", OrderSide::Sell, 6, 0, 98, 0),
            order(2, "s2", OrderSide::Sell, 5, 0, 99, 1),
            order(3, "buyer", OrderSide::Buy, 10, 0, 100, 2),
        ];
        let fills = plan_matches(&book);
        assert_eq!(fills.len(), 2);
        assert_eq!((fills[0].sell_order_id, fills[0].quantity, fills[0].price), (1, 6, Rupees::from_rupees(98)));
        assert_eq!((fills[1].sell_order_id, fills[1].quantity, fills[1].price), (2, 4, Rupees::from_rupees(99)));
    }

    #[test]
    fn equal_prices_tie_break_on_time() {
        let book = vec![
            order(1, "late", OrderSide::Sell, 5, 0, 95, 5),
            order(2, "early", OrderSide::Sell, 5, 0, 95, 1),
            order(3, "buyer", OrderSide::Buy, 5, 0, 95, 6),
        ];
        let fills = plan_matches(&book);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].sell_order_id, 2);
    }

    #[test]
    fn best_bid_served_first() {
        let book = vec![
            order(1, "low", OrderSide::Buy, 5, 0, 96, 0),
            order(2, "high", OrderSide::Buy, 5, 0, 99, 1),
            order(3, "seller", OrderSide::Sell, 5, 0, 95, 2),
        ];
        let fills = plan_matches(&book);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].buy_order_id, 2);
        assert_eq!(fills[0].price, Rupees::from_rupees(95));
    }

    #[test]
    fn respects_partial_fills_and_terminal_orders() {
        let mut cancelled = order(1, "bob", OrderSide::Sell, 10, 0, 90, 0);
        cancelled.status = OrderStatus::Cancelled;
        let book = vec![
            cancelled,
            order(2, "carol", OrderSide::Sell, 10, 6, 92, 1), // 4 remaining
            order(3, "alice", OrderSide::Buy, 10, 0, 95, 2),
        ];
        let fills = plan_matches(&book);
        assert_eq!(fills.len(), 1);
        assert_eq!((fills[0].sell_order_id, fills[0].quantity), (2, 4));
    }

    #[test]
    fn never_matches_own_orders() {
        let book = vec![
            order(1, "alice", OrderSide::Sell, 10, 0, 95, 0),
            order(2, "alice", OrderSide::Buy, 10, 0, 100, 1),
            order(3, "bob", OrderSide::Buy, 4, 0, 100, 2),
        ];
        let fills = plan_matches(&book);
        assert_eq!(fills.len(), 1);
        assert_eq!((fills[0].buy_order_id, fills[0].quantity), (3, 4));
    }

    #[test]
    fn fill_quantity_bounded_by_both_remainders() {
        let book = vec![
            order(1, "s", OrderSide::Sell, 100, 0, 95, 0),
            order(2, "b", OrderSide::Buy, 7, 0, 95, 1),
        ];
        let fills = plan_matches(&book);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].quantity, 7);
        assert_eq!(fills[0].total_amount(), Rupees::from_rupees(665));
    }
}
