// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use moneylist::application::LedgerService;
use moneylist::domain::{NewTransaction, TransactionId, TransactionKind};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to open a service over a database whose `transactions` table was
/// created by an older version and filled with the given raw rows
pub async fn legacy_service(rows: &[&str]) -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_file = temp_dir.path().join("legacy.db");
    let db_path = db_file.to_str().unwrap();

    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path)).await?;
    sqlx::query(
        "CREATE TABLE transactions (id INTEGER PRIMARY KEY AUTOINCREMENT, \
         date TEXT, type TEXT, amount REAL, description TEXT)",
    )
    .execute(&pool)
    .await?;
    for row in rows {
        sqlx::query(&format!(
            "INSERT INTO transactions (date, type, amount, description) VALUES ({})",
            row
        ))
        .execute(&pool)
        .await?;
    }
    pool.close().await;

    let service = LedgerService::init(db_path).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into a NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Record a transaction from plain values and return its id
pub async fn record(
    service: &LedgerService,
    date: &str,
    kind: TransactionKind,
    amount_cents: i64,
    description: &str,
) -> Result<TransactionId> {
    let fields = NewTransaction::new(parse_date(date), kind, amount_cents, description)?;
    Ok(service.create_transaction(fields).await?)
}

/// Test fixture: the salary/groceries ledger
pub struct SampleLedger;

impl SampleLedger {
    /// Salary on the 1st, groceries on the 5th
    pub async fn create_basic(service: &LedgerService) -> Result<(TransactionId, TransactionId)> {
        let salary =
            record(service, "2024-01-01", TransactionKind::Income, 100000, "salary").await?;
        let groceries =
            record(service, "2024-01-05", TransactionKind::Expense, 20050, "groceries").await?;
        Ok((salary, groceries))
    }

    /// A few months of mixed activity, with non-ASCII text and awkward descriptions
    pub async fn create_mixed(service: &LedgerService) -> Result<()> {
        Self::create_basic(service).await?;
        let dinner = "dinner, with \"friends\"";
        record(service, "2024-01-20", TransactionKind::Expense, 4599, dinner).await?;
        record(service, "2024-02-01", TransactionKind::Income, 100000, "工资").await?;
        record(service, "2024-02-03", TransactionKind::Expense, 120000, "rent\nFebruary").await?;
        record(service, "2024-02-03", TransactionKind::Expense, 0, "").await?;
        Ok(())
    }
}
