use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use crate::domain::{
    cents_to_units, units_to_cents, Cents, NewTransaction, Transaction, TransactionId,
    TransactionKind, DATE_FORMAT,
};

use super::MIGRATION_001_INITIAL;

/// Amount column converted to integer cents, so SQL sums stay exact.
const AMOUNT_CENTS: &str = "CAST(ROUND(amount * 100) AS INTEGER)";

/// Repository for persisting and querying transactions.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Close the underlying pool, waiting for connections to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Insert a new transaction and return its assigned id.
    pub async fn insert_transaction(&self, fields: &NewTransaction) -> Result<TransactionId> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (date, type, amount, description)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(fields.date.format(DATE_FORMAT).to_string())
        .bind(fields.kind.as_str())
        .bind(cents_to_units(fields.amount_cents))
        .bind(&fields.description)
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;

        Ok(result.last_insert_rowid())
    }

    /// Replace every field of a transaction. Returns false if no row has that id.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        fields: &NewTransaction,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET date = ?, type = ?, amount = ?, description = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.date.format(DATE_FORMAT).to_string())
        .bind(fields.kind.as_str())
        .bind(cents_to_units(fields.amount_cents))
        .bind(&fields.description)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update transaction")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a transaction. Returns false if no row has that id.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, date, type, amount, description
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_transaction(&row)?)),
            None => Ok(None),
        }
    }

    /// List transactions dated within `[from_date, to_date]`, optionally of one
    /// kind, newest first.
    pub async fn list_transactions_filtered(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Transaction>> {
        let mut query = String::from(
            "SELECT id, date, type, amount, description FROM transactions \
             WHERE date >= ? AND date <= ?",
        );
        if kind.is_some() {
            query.push_str(" AND type = ?");
        }
        query.push_str(" ORDER BY date DESC, id DESC");

        let mut sql_query = sqlx::query(&query)
            .bind(from_date.format(DATE_FORMAT).to_string())
            .bind(to_date.format(DATE_FORMAT).to_string());
        if let Some(kind) = kind {
            sql_query = sql_query.bind(kind.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list filtered transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List every transaction regardless of date, newest first.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, type, amount, description
            FROM transactions
            ORDER BY date DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Sum of signed contributions over the whole ledger.
    pub async fn compute_balance(&self) -> Result<Cents> {
        let query = format!(
            "SELECT COALESCE(SUM(CASE WHEN type = ? THEN {amt} ELSE -{amt} END), 0) AS balance \
             FROM transactions",
            amt = AMOUNT_CENTS
        );
        let row = sqlx::query(&query)
            .bind(TransactionKind::Income.as_str())
            .fetch_one(&self.pool)
            .await
            .context("Failed to compute balance")?;

        row.try_get("balance").context("Invalid balance result")
    }

    /// Sum of amounts over all transactions of one kind.
    pub async fn sum_by_kind(&self, kind: TransactionKind) -> Result<Cents> {
        let query = format!(
            "SELECT COALESCE(SUM({}), 0) AS total FROM transactions WHERE type = ?",
            AMOUNT_CENTS
        );
        let row = sqlx::query(&query)
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await
            .context("Failed to sum transactions by type")?;

        row.try_get("total").context("Invalid total result")
    }

    /// Count all transactions.
    pub async fn count_transactions(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;
        row.try_get("count").context("Invalid count result")
    }

    // Legacy rows may hold NULL or text in any column
    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id: TransactionId = row.try_get("id").context("Invalid stored id")?;

        let date_str: String = row
            .try_get::<Option<String>, _>("date")
            .ok()
            .flatten()
            .with_context(|| format!("Invalid stored date for transaction {}", id))?;
        let kind_str: String = row
            .try_get::<Option<String>, _>("type")
            .ok()
            .flatten()
            .with_context(|| format!("Invalid stored type for transaction {}", id))?;
        let amount: f64 = row
            .try_get::<Option<f64>, _>("amount")
            .ok()
            .flatten()
            .with_context(|| format!("Invalid stored amount for transaction {}", id))?;
        let description: Option<String> = row
            .try_get("description")
            .with_context(|| format!("Invalid stored description for transaction {}", id))?;

        Ok(Transaction {
            id,
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .with_context(|| format!("Invalid stored date: {}", date_str))?,
            kind: kind_str
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid transaction type: {}", kind_str))?,
            amount_cents: units_to_cents(amount)
                .with_context(|| format!("Invalid stored amount: {}", amount))?,
            description: description.unwrap_or_default(),
        })
    }
}
