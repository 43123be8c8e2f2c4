use sqlx::SqliteConnection;
use ue_common::Rupees;

use crate::traits::OrderFlowError;

pub(crate) async fn balance(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<Rupees>, OrderFlowError> {
    let balance = sqlx::query_scalar::<_, Rupees>("SELECT balance FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(balance)
}

/// Credits the wallet and returns the new balance. The wallet row is created on first credit.
pub(crate) async fn credit(
    user_id: &str,
    amount: Rupees,
    conn: &mut SqliteConnection,
) -> Result<Rupees, OrderFlowError> {
    sqlx::query("INSERT OR IGNORE INTO wallets (user_id) VALUES ($1)").bind(user_id).execute(&mut *conn).await?;
    let balance = sqlx::query_scalar::<_, Rupees>(
        "UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE user_id = $2 RETURNING balance",
    )
    .bind(amount)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(balance)
}

/// Debits the wallet if and only if it holds at least `amount`. Returns the new balance, or `None` when the
/// funds (or the wallet row) are missing. The guard lives in the SQL so the balance can never go negative,
/// even with concurrent debits.
pub(crate) async fn try_debit(
    user_id: &str,
    amount: Rupees,
    conn: &mut SqliteConnection,
) -> Result<Option<Rupees>, OrderFlowError> {
    let balance = sqlx::query_scalar::<_, Rupees>(
        r#"
        UPDATE wallets SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $2 AND balance >= $1
        RETURNING balance
        "#,
    )
    .bind(amount)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}
