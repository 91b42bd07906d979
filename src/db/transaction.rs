use alloy_primitives::U256;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use super::{StoreError, TransactionStore};
use crate::models::Transaction;
use crate::validation::validate_address;

pub struct SqliteTransactionStore {
    pool: SqlitePool,
}

impl SqliteTransactionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn to_column(field: &str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{} {} out of range", field, value)))
}

fn from_column(field: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{} {} is negative", field, value)))
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, StoreError> {
    let value: String = row.try_get("value")?;
    let value = U256::from_str(&value)
        .map_err(|e| StoreError::Corrupt(format!("value {:?}: {}", value, e)))?;

    Ok(Transaction {
        hash: row.try_get("hash")?,
        from: row.try_get("from_address")?,
        to: row.try_get("to_address")?,
        value,
        block_hash: row.try_get("block_hash")?,
        transaction_index: from_column("transaction_index", row.try_get("transaction_index")?)?,
        nonce: from_column("nonce", row.try_get("nonce")?)?,
        input: row.try_get("input")?,
    })
}

#[async_trait]
impl TransactionStore for SqliteTransactionStore {
    async fn save(&self, address: &str, transaction: &Transaction) -> Result<(), StoreError> {
        let address = validate_address(address)?;
        let tx_key = transaction.hash_key();
        let transaction_index = to_column("transaction_index", transaction.transaction_index)?;
        let nonce = to_column("nonce", transaction.nonce)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO transactions
            (tx_key, hash, from_address, to_address, value, block_hash,
             transaction_index, nonce, input)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(tx_key) DO UPDATE SET
                from_address = excluded.from_address,
                to_address = excluded.to_address,
                value = excluded.value,
                block_hash = excluded.block_hash,
                transaction_index = excluded.transaction_index,
                nonce = excluded.nonce,
                input = excluded.input,
                updated_at = strftime('%s', 'now')
            "#,
        )
        .bind(&tx_key)
        .bind(&transaction.hash)
        .bind(&transaction.from)
        .bind(&transaction.to)
        .bind(transaction.value.to_string())
        .bind(&transaction.block_hash)
        .bind(transaction_index)
        .bind(nonce)
        .bind(&transaction.input)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO address_transactions (address, tx_key) VALUES (?, ?)
             ON CONFLICT(address, tx_key) DO NOTHING",
        )
        .bind(address.as_str())
        .bind(&tx_key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, StoreError> {
        let address = validate_address(address)?;

        let rows = sqlx::query(
            r#"SELECT t.hash, t.from_address, t.to_address, t.value, t.block_hash,
                      t.transaction_index, t.nonce, t.input
               FROM address_transactions a
               JOIN transactions t ON t.tx_key = a.tx_key
               WHERE a.address = ?
               ORDER BY a.rowid ASC"#,
        )
        .bind(address.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }
}
