use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // Keyed by the lower-cased hash
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            tx_key TEXT PRIMARY KEY,
            hash TEXT NOT NULL,
            from_address TEXT NOT NULL,
            to_address TEXT NOT NULL,
            value TEXT NOT NULL,
            block_hash TEXT NOT NULL,
            transaction_index INTEGER NOT NULL,
            nonce INTEGER NOT NULL,
            input TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )"
    )
    .execute(pool)
    .await?;

    // Per-address buckets; rowid keeps insertion order
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS address_transactions (
            address TEXT NOT NULL,
            tx_key TEXT NOT NULL,
            PRIMARY KEY (address, tx_key),
            FOREIGN KEY (tx_key) REFERENCES transactions(tx_key)
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS subscriptions (
            address TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS progress (
            id INTEGER PRIMARY KEY,
            block_number INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_from_address
         ON transactions(from_address)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_to_address
         ON transactions(to_address)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
