use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Open the SQLite connection pool and run migrations.
///
/// The database file is created if it doesn't exist yet.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = pool_options(database_url).connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!(database_url, "Database initialized and migrations applied");

    Ok(pool)
}

fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if database_url.contains(":memory:") {
        // Every in-memory connection is its own database, and it vanishes
        // with its connection. Keep exactly one open for the pool's lifetime.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}
