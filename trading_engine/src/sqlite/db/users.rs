use sqlx::SqliteConnection;

use crate::{db_types::User, traits::OrderFlowError};

/// Inserts or updates a user record. Also makes sure the wallet row exists, since every user has exactly
/// one wallet.
pub(crate) async fn upsert_user(
    user_id: &str,
    display_name: &str,
    conn: &mut SqliteConnection,
) -> Result<User, OrderFlowError> {
    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, display_name) VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET display_name = excluded.display_name
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .fetch_one(&mut *conn)
    .await?;
    sqlx::query("INSERT OR IGNORE INTO wallets (user_id) VALUES ($1)").bind(user_id).execute(conn).await?;
    Ok(user)
}

/// `None` if the user does not exist.
pub(crate) async fn kyc_verified(user_id: &str, conn: &mut SqliteConnection) -> Result<Option<bool>, OrderFlowError> {
    let verified = sqlx::query_scalar::<_, bool>("SELECT kyc_verified FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(verified)
}

pub(crate) async fn set_kyc_verified(
    user_id: &str,
    verified: bool,
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    let res = sqlx::query("UPDATE users SET kyc_verified = $1 WHERE id = $2")
        .bind(verified)
        .bind(user_id)
        .execute(conn)
        .await?;
    if res.rows_affected() == 0 {
        return Err(OrderFlowError::UserNotFound(user_id.to_string()));
    }
    Ok(())
}
