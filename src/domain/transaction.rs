use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{parse_cents, Cents};

pub type TransactionId = i64;

/// Date format used for storage and exchange files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The two mutually exclusive transaction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "收入")]
    Income,
    #[serde(rename = "支出")]
    Expense,
}

impl TransactionKind {
    /// Label persisted in the database and written to exchange files.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "收入",
            TransactionKind::Expense => "支出",
        }
    }

    /// English name, used for display.
    pub fn name(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "收入" => Ok(TransactionKind::Income),
            "支出" => Ok(TransactionKind::Expense),
            other => match other.to_lowercase().as_str() {
                "income" => Ok(TransactionKind::Income),
                "expense" => Ok(TransactionKind::Expense),
                _ => Err(ValidationError::InvalidKind(s.to_string())),
            },
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single dated income or expense entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Assigned by the store, never reused
    pub id: TransactionId,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    /// Always non-negative; the sign comes from `kind`
    pub amount_cents: Cents,
    pub description: String,
}

impl Transaction {
    /// Contribution of this entry to the ledger balance.
    pub fn signed_amount(&self) -> Cents {
        match self.kind {
            TransactionKind::Income => self.amount_cents,
            TransactionKind::Expense => -self.amount_cents,
        }
    }

    /// The editable fields of this transaction.
    pub fn fields(&self) -> NewTransaction {
        NewTransaction {
            date: self.date,
            kind: self.kind,
            amount_cents: self.amount_cents,
            description: self.description.clone(),
        }
    }
}

/// Every field of a transaction except its id. Used both for creation and
/// for full replacement on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub amount_cents: Cents,
    pub description: String,
}

impl NewTransaction {
    pub fn new(
        date: NaiveDate,
        kind: TransactionKind,
        amount_cents: Cents,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_amount(amount_cents)?;
        Ok(Self {
            date,
            kind,
            amount_cents,
            description: description.into(),
        })
    }

    /// Build from raw text fields, as typed by a user or read from a file.
    pub fn parse(
        date: &str,
        kind: &str,
        amount: &str,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let date = parse_date(date)?;
        let kind = kind.parse()?;
        let amount_cents =
            parse_cents(amount).map_err(|_| ValidationError::InvalidAmount(amount.to_string()))?;
        Self::new(date, kind, amount_cents, description)
    }

    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            date: self.date,
            kind: self.kind,
            amount_cents: self.amount_cents,
            description: self.description,
        }
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

pub fn validate_amount(amount_cents: Cents) -> Result<(), ValidationError> {
    if amount_cents < 0 {
        return Err(ValidationError::NegativeAmount(amount_cents));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidAmount(String),
    NegativeAmount(Cents),
    InvalidKind(String),
    InvalidDate(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidAmount(s) => write!(f, "invalid amount '{}'", s),
            ValidationError::NegativeAmount(c) => {
                write!(f, "amount must not be negative ({} cents)", c)
            }
            ValidationError::InvalidKind(s) => {
                write!(f, "invalid type '{}' (expected 收入/income or 支出/expense)", s)
            }
            ValidationError::InvalidDate(s) => {
                write!(f, "invalid date '{}' (expected YYYY-MM-DD)", s)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
