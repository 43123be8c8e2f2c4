mod db;
mod sqlite_impl;

pub use db::{create_database_if_missing, db_url};
pub use sqlite_impl::SqliteDatabase;
