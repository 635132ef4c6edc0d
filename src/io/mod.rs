//! Bulk import and export of the ledger in exchange formats.
//!
//! Two formats are supported, both carrying exactly the fields
//! `date, type, amount, description` (ids are never exchanged):
//!
//! - CSV, written with a UTF-8 byte-order mark so spreadsheet tools pick the
//!   right encoding;
//! - JSON, a single array of objects, indented with four spaces.

mod export;
mod import;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::AppError;
use crate::domain::{cents_to_units, Transaction, TransactionKind, DATE_FORMAT};

pub use export::*;
pub use import::*;

/// Column names shared by both formats, in file order.
pub const EXCHANGE_FIELDS: [&str; 4] = ["date", "type", "amount", "description"];

/// UTF-8 byte-order mark written at the start of CSV exports.
pub const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeFormat {
    Csv,
    Json,
}

impl ExchangeFormat {
    /// Pick the format from a file extension (`.csv` or `.json`).
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(ExchangeFormat::Csv),
            Some("json") => Ok(ExchangeFormat::Json),
            _ => Err(AppError::Format(format!(
                "unsupported file type '{}' (expected .csv or .json)",
                path.display()
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeFormat::Csv => "csv",
            ExchangeFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ExchangeFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExchangeFormat::Csv),
            "json" => Ok(ExchangeFormat::Json),
            other => Err(AppError::Format(format!("unknown format '{}'", other))),
        }
    }
}

/// A transaction as written to a JSON exchange file.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRecord {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
}

impl From<&Transaction> for ExchangeRecord {
    fn from(t: &Transaction) -> Self {
        Self {
            date: t.date.format(DATE_FORMAT).to_string(),
            kind: t.kind,
            amount: cents_to_units(t.amount_cents),
            description: t.description.clone(),
        }
    }
}

/// A transaction as read from a CSV exchange file. Extra columns are ignored.
#[derive(Debug, Clone, Deserialize)]
struct CsvRecord {
    date: String,
    #[serde(rename = "type")]
    kind: String,
    amount: String,
    description: String,
}

/// A transaction as read from a JSON exchange file. Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
struct JsonRecord {
    date: String,
    #[serde(rename = "type")]
    kind: String,
    amount: JsonAmount,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum JsonAmount {
    Number(f64),
    Text(String),
}

fn csv_error(err: csv::Error) -> AppError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => AppError::Io(e),
        _ => AppError::Format(message),
    }
}

fn json_error(err: serde_json::Error) -> AppError {
    if err.is_io() {
        AppError::Io(err.into())
    } else {
        AppError::Format(err.to_string())
    }
}
