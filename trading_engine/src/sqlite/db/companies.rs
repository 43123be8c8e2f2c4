use sqlx::SqliteConnection;
use ue_common::Rupees;

use crate::{
    db_types::{Company, NewCompany},
    traits::OrderFlowError,
};

/// Inserts a company, or updates the existing record with the same symbol.
pub(crate) async fn upsert_company(
    company: NewCompany,
    conn: &mut SqliteConnection,
) -> Result<Company, OrderFlowError> {
    let company: Company = sqlx::query_as(
        r#"
        INSERT INTO companies (name, symbol, active, available_shares, current_price)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (symbol) DO UPDATE SET
            name = excluded.name,
            active = excluded.active,
            available_shares = excluded.available_shares,
            current_price = excluded.current_price,
            updated_at = CURRENT_TIMESTAMP
        RETURNING *
        "#,
    )
    .bind(&company.name)
    .bind(&company.symbol)
    .bind(company.active)
    .bind(company.available_shares)
    .bind(company.current_price)
    .fetch_one(conn)
    .await?;
    Ok(company)
}

pub(crate) async fn fetch_company(
    company_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Company>, OrderFlowError> {
    let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
        .bind(company_id)
        .fetch_optional(conn)
        .await?;
    Ok(company)
}

pub(crate) async fn list_companies(conn: &mut SqliteConnection) -> Result<Vec<Company>, OrderFlowError> {
    let companies = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY symbol ASC").fetch_all(conn).await?;
    Ok(companies)
}

/// Writes back the last traded price. This is the only company field the engine mutates.
pub(crate) async fn set_last_price(
    company_id: i64,
    price: Rupees,
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    sqlx::query("UPDATE companies SET current_price = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(price)
        .bind(company_id)
        .execute(conn)
        .await?;
    Ok(())
}
