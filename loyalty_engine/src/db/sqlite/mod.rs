pub mod db;

pub mod orders;
pub mod user_accounts;
pub mod withdrawals;

pub use db::SqliteDatabase;

use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a connection pool, creating the database file if it does not exist yet.
///
/// Writers wait up to [`BUSY_TIMEOUT`] for the database write lock, which is how concurrent settlements are
/// serialized.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
