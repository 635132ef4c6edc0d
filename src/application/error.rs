use thiserror::Error;

use crate::domain::{TransactionId, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid transaction: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed exchange file: {0}")]
    Format(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
