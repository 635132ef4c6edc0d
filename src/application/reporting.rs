use serde::{Deserialize, Serialize};

use crate::domain::Cents;

/// Whole-ledger totals. Never restricted to a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_income: Cents,
    pub total_expense: Cents,
    pub balance: Cents,
    pub transaction_count: i64,
}

impl LedgerSummary {
    /// Income as a percentage of all money moved (0 when the ledger is empty).
    pub fn income_share(&self) -> f64 {
        share(self.total_income, self.total_income + self.total_expense)
    }

    /// Expense as a percentage of all money moved (0 when the ledger is empty).
    pub fn expense_share(&self) -> f64 {
        share(self.total_expense, self.total_income + self.total_expense)
    }
}

fn share(part: Cents, total: Cents) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
