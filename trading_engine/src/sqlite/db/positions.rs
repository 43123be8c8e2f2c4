use log::error;
use sqlx::SqliteConnection;
use ue_common::Rupees;

use crate::{db_types::Position, traits::OrderFlowError};

pub(crate) async fn position(
    user_id: &str,
    company_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Position>, OrderFlowError> {
    let position = sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE user_id = $1 AND company_id = $2")
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(conn)
        .await?;
    Ok(position)
}

pub(crate) async fn positions_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Position>, OrderFlowError> {
    let positions = sqlx::query_as::<_, Position>("SELECT * FROM positions WHERE user_id = $1 ORDER BY company_id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(positions)
}

/// Commits `quantity` shares of an existing holding to a sell order. Returns false when the user does not
/// hold enough unreserved shares; the check and the update are one statement, so two concurrent sell orders
/// cannot both commit the same shares.
pub(crate) async fn reserve_shares(
    user_id: &str,
    company_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderFlowError> {
    let res = sqlx::query(
        r#"
        UPDATE positions SET reserved_quantity = reserved_quantity + $1, updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $2 AND company_id = $3 AND quantity - reserved_quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(user_id)
    .bind(company_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Releases shares reserved by a now-cancelled sell order.
pub(crate) async fn release_shares(
    user_id: &str,
    company_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    let res = sqlx::query(
        r#"
        UPDATE positions SET reserved_quantity = reserved_quantity - $1, updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $2 AND company_id = $3 AND reserved_quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(user_id)
    .bind(company_id)
    .execute(conn)
    .await?;
    if res.rows_affected() == 0 {
        error!("📊️ Tried to release {quantity} shares of company {company_id} for {user_id} that were not reserved");
        return Err(OrderFlowError::Database(format!(
            "position for user {user_id} / company {company_id} has fewer than {quantity} reserved shares"
        )));
    }
    Ok(())
}

/// Applies a buy fill: adds the shares and the spend to the position, recomputing the weighted-average cost
/// basis. Creates the position row on the first fill.
pub(crate) async fn apply_buy_fill(
    user_id: &str,
    company_id: i64,
    quantity: i64,
    amount: Rupees,
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    sqlx::query(
        r#"
        INSERT INTO positions (user_id, company_id, quantity, average_price, total_invested)
        VALUES ($1, $2, $3, $4 / $3, $4)
        ON CONFLICT (user_id, company_id) DO UPDATE SET
            quantity = quantity + excluded.quantity,
            total_invested = total_invested + excluded.total_invested,
            average_price = (total_invested + excluded.total_invested) / (quantity + excluded.quantity),
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user_id)
    .bind(company_id)
    .bind(quantity)
    .bind(amount)
    .execute(conn)
    .await?;
    Ok(())
}

/// Applies a sell fill: removes the shares (and their reservation) and reduces the invested amount at the
/// average price, which therefore stays put. Deletes the row once the holding is empty.
pub(crate) async fn apply_sell_fill(
    user_id: &str,
    company_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    let res = sqlx::query(
        r#"
        UPDATE positions SET
            quantity = quantity - $1,
            reserved_quantity = reserved_quantity - $1,
            total_invested = total_invested - average_price * $1,
            updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $2 AND company_id = $3 AND quantity >= $1 AND reserved_quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(user_id)
    .bind(company_id)
    .execute(&mut *conn)
    .await?;
    if res.rows_affected() == 0 {
        error!("📊️ Sell fill of {quantity} shares for {user_id} / company {company_id} had no backing position");
        return Err(OrderFlowError::Database(format!(
            "position for user {user_id} / company {company_id} cannot cover a fill of {quantity} shares"
        )));
    }
    sqlx::query("DELETE FROM positions WHERE user_id = $1 AND company_id = $2 AND quantity = 0")
        .bind(user_id)
        .bind(company_id)
        .execute(conn)
        .await?;
    Ok(())
}
