use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Cents, Transaction};

/// One point of the running balance series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePoint {
    /// 1-based position in the series
    pub index: usize,
    pub date: NaiveDate,
    /// Balance after applying this transaction
    pub balance: Cents,
}

/// Accumulate signed contributions in chronological order, starting from zero.
/// The input order does not matter; entries are sorted by date, then id.
pub fn running_balance(transactions: &[Transaction]) -> Vec<BalancePoint> {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by_key(|t| (t.date, t.id));

    let mut balance = 0;
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            balance += t.signed_amount();
            BalancePoint {
                index: i + 1,
                date: t.date,
                balance,
            }
        })
        .collect()
}
