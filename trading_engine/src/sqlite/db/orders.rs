use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};
use ue_common::Rupees;

use crate::{
    db_types::{Order, OrderSide, OrderStatus, OrderType},
    order_objects::OrderQueryFilter,
    traits::OrderFlowError,
};

/// Inserts a new `Pending` order. Reservation (wallet debit / share hold) must already have happened in the
/// same transaction.
pub(crate) async fn insert_order(
    user_id: &str,
    company_id: i64,
    side: OrderSide,
    order_type: OrderType,
    quantity: i64,
    price: Rupees,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let order: Order = sqlx::query_as(
        r#"
        INSERT INTO orders (user_id, company_id, side, order_type, quantity, price, total_amount)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(company_id)
    .bind(side)
    .bind(order_type)
    .bind(quantity)
    .bind(price)
    .bind(price * quantity)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub(crate) async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderFlowError> {
    let order =
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// The book for one company: every open order with quantity still remaining, oldest first. The matching
/// planner does its own price-time ranking.
pub(crate) async fn open_orders_for_company(
    company_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderFlowError> {
    let book = sqlx::query_as::<_, Order>(
        r#"
        SELECT * FROM orders
        WHERE company_id = $1 AND status IN ('Pending', 'Partial') AND filled_quantity < quantity
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(company_id)
    .fetch_all(conn)
    .await?;
    Ok(book)
}

/// Fetches orders according to the criteria in the `OrderQueryFilter`, ordered by `created_at` ascending.
pub(crate) async fn search_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderFlowError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(company_id) = query.company_id {
        where_clause.push("company_id = ");
        where_clause.push_bind_unseparated(company_id);
    }
    if let Some(side) = query.side {
        where_clause.push("side = ");
        where_clause.push_bind_unseparated(side.to_string());
    }
    if !query.statuses.is_empty() {
        let statuses = query.statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("📋️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Records a fill against an order, bumping the counters and deriving the new status in one statement.
pub(crate) async fn apply_fill(
    order_id: i64,
    quantity: i64,
    amount: Rupees,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let order: Order = sqlx::query_as(
        r#"
        UPDATE orders SET
            filled_quantity = filled_quantity + $1,
            filled_amount = filled_amount + $2,
            status = CASE WHEN filled_quantity + $1 >= quantity THEN 'Completed' ELSE 'Partial' END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(quantity)
    .bind(amount)
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub(crate) async fn update_order_status(
    order_id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let order: Order =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status.to_string())
            .bind(order_id)
            .fetch_one(conn)
            .await?;
    Ok(order)
}
