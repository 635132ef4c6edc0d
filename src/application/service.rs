use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::debug;

use crate::domain::{
    running_balance, validate_amount, BalancePoint, Cents, NewTransaction, Transaction,
    TransactionId, TransactionKind,
};
use crate::storage::Repository;

use super::{AppError, LedgerSummary};

/// Earliest date a listing starts from when no start date is given.
pub fn epoch_floor() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, GUI, import/export).
pub struct LedgerService {
    repo: Repository,
}

/// Filter for listing transactions. Unset bounds fall back to
/// `1970-01-01` and today.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

impl TransactionFilter {
    pub fn between(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self {
            from_date: Some(from_date),
            to_date: Some(to_date),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open the database at the given path, creating the file and schema if
    /// they don't exist yet.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        debug!(path = database_path, "opened ledger database");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Release the database handle.
    pub async fn close(self) {
        self.repo.close().await;
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a new transaction and return its id.
    pub async fn create_transaction(
        &self,
        fields: NewTransaction,
    ) -> Result<TransactionId, AppError> {
        validate_amount(fields.amount_cents)?;

        let id = self.repo.insert_transaction(&fields).await?;
        debug!(
            id,
            date = %fields.date,
            kind = fields.kind.name(),
            amount_cents = fields.amount_cents,
            "created transaction"
        );
        Ok(id)
    }

    /// Replace every field of an existing transaction.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        fields: NewTransaction,
    ) -> Result<Transaction, AppError> {
        validate_amount(fields.amount_cents)?;

        if !self.repo.update_transaction(id, &fields).await? {
            return Err(AppError::TransactionNotFound(id));
        }
        debug!(id, "updated transaction");
        Ok(fields.with_id(id))
    }

    /// Delete a transaction, returning what was removed.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        let transaction = self.get_transaction(id).await?;
        if !self.repo.delete_transaction(id).await? {
            return Err(AppError::TransactionNotFound(id));
        }
        debug!(id, "deleted transaction");
        Ok(transaction)
    }

    /// Get a transaction by id.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await?
            .ok_or(AppError::TransactionNotFound(id))
    }

    /// List transactions inside the filter's date window, newest first.
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        let from_date = filter.from_date.unwrap_or_else(epoch_floor);
        let to_date = filter
            .to_date
            .unwrap_or_else(|| Local::now().date_naive());

        Ok(self
            .repo
            .list_transactions_filtered(from_date, to_date, filter.kind)
            .await?)
    }

    /// List every transaction, including future-dated ones, newest first.
    pub async fn list_all_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions().await?)
    }

    // ========================
    // Aggregates
    // ========================

    /// Balance over the whole ledger: income minus expenses.
    pub async fn balance(&self) -> Result<Cents, AppError> {
        Ok(self.repo.compute_balance().await?)
    }

    pub async fn total_income(&self) -> Result<Cents, AppError> {
        Ok(self.repo.sum_by_kind(TransactionKind::Income).await?)
    }

    pub async fn total_expense(&self) -> Result<Cents, AppError> {
        Ok(self.repo.sum_by_kind(TransactionKind::Expense).await?)
    }

    /// Totals for the whole ledger in one value.
    pub async fn summary(&self) -> Result<LedgerSummary, AppError> {
        Ok(LedgerSummary {
            total_income: self.total_income().await?,
            total_expense: self.total_expense().await?,
            balance: self.balance().await?,
            transaction_count: self.repo.count_transactions().await?,
        })
    }

    /// Running balance over the full history, oldest first.
    pub async fn balance_trend(&self) -> Result<Vec<BalancePoint>, AppError> {
        let transactions = self.repo.list_transactions().await?;
        Ok(running_balance(&transactions))
    }
}
