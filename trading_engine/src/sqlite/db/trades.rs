use sqlx::SqliteConnection;
use ue_common::Rupees;

use crate::{db_types::Trade, matching::MatchProposal, traits::OrderFlowError};

pub(crate) async fn insert_trade(
    proposal: &MatchProposal,
    company_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Trade, OrderFlowError> {
    let trade: Trade = sqlx::query_as(
        r#"
        INSERT INTO trades (buy_order_id, sell_order_id, buyer_id, seller_id, company_id, quantity, price, total_amount)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(proposal.buy_order_id)
    .bind(proposal.sell_order_id)
    .bind(&proposal.buyer_id)
    .bind(&proposal.seller_id)
    .bind(company_id)
    .bind(proposal.quantity)
    .bind(proposal.price)
    .bind(proposal.total_amount())
    .fetch_one(conn)
    .await?;
    Ok(trade)
}

/// The price of the most recent trade in the company, used as the execution reference for market orders.
pub(crate) async fn last_trade_price(
    company_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Rupees>, OrderFlowError> {
    let price =
        sqlx::query_scalar::<_, Rupees>("SELECT price FROM trades WHERE company_id = $1 ORDER BY id DESC LIMIT 1")
            .bind(company_id)
            .fetch_optional(conn)
            .await?;
    Ok(price)
}

pub(crate) async fn trades_for_company(
    company_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Trade>, OrderFlowError> {
    let trades = sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE company_id = $1 ORDER BY id ASC")
        .bind(company_id)
        .fetch_all(conn)
        .await?;
    Ok(trades)
}

pub(crate) async fn trades_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Trade>, OrderFlowError> {
    let trades = sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades WHERE buy_order_id = $1 OR sell_order_id = $1 ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(trades)
}
