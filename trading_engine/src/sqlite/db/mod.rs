//! Low-level SQLite interactions.
//!
//! Everything in here is a plain function taking a `&mut SqliteConnection`, so callers can compose several
//! calls inside one transaction by passing `&mut *tx`. Nothing in this module begins or commits
//! transactions itself.

use std::env;

use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Error as SqlxError, Sqlite, SqlitePool};

pub mod companies;
pub mod orders;
pub mod positions;
pub mod trades;
pub mod users;
pub mod wallets;

const SQLITE_DB_URL: &str = "sqlite://data/unlisted_edge.db";

pub fn db_url() -> String {
    let result = env::var("UE_DATABASE_URL").unwrap_or_else(|_| {
        info!("UE_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// Create the database file if it does not exist yet. Running migrations is a separate step
/// ([`crate::SqliteDatabase::run_migrations`]).
pub async fn create_database_if_missing(url: &str) -> Result<(), SqlxError> {
    if !Sqlite::database_exists(url).await.unwrap_or(false) {
        Sqlite::create_database(url).await?;
        info!("Created Sqlite database {url}");
    }
    Ok(())
}
