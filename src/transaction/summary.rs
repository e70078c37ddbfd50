//! Totals and the recent trend series shown on the dashboard.

use rusqlite::Connection;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error, UserID,
    transaction::{Transaction, list_transactions},
};

/// How many of the most recent transactions make up the trend series.
pub const TREND_LENGTH: usize = 7;

/// How many user-perceived characters of a label are kept for chart axis labels.
const SHORT_LABEL_LENGTH: usize = 4;

/// One bar in the trend chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// The first few characters of the transaction label.
    pub short_label: String,
    /// The signed amount of the transaction.
    pub amount: f64,
}

/// Income, expense and balance totals plus the recent trend.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// The sum of all positive amounts.
    pub income: f64,
    /// The sum of all negative amounts, zero or negative.
    pub expense: f64,
    /// `income + expense`.
    pub balance: f64,
    /// Up to [TREND_LENGTH] of the most recent transactions, oldest first.
    pub recent_trend: Vec<TrendPoint>,
}

/// Summarize `transactions`, which must be ordered newest first as returned
/// by [list_transactions].
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let income: f64 = transactions
        .iter()
        .map(|transaction| transaction.amount)
        .filter(|amount| *amount > 0.0)
        .sum();
    let expense: f64 = transactions
        .iter()
        .map(|transaction| transaction.amount)
        .filter(|amount| *amount < 0.0)
        .sum();

    let mut recent_trend: Vec<TrendPoint> = transactions
        .iter()
        .take(TREND_LENGTH)
        .map(|transaction| TrendPoint {
            short_label: shorten_label(&transaction.label),
            amount: transaction.amount,
        })
        .collect();
    recent_trend.reverse();

    Summary {
        income,
        expense,
        balance: income + expense,
        recent_trend,
    }
}

/// Query `owner`'s transactions and summarize them.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn compute_summary(owner: UserID, connection: &Connection) -> Result<Summary, Error> {
    list_transactions(owner, connection).map(|transactions| summarize(&transactions))
}

fn shorten_label(label: &str) -> String {
    label.graphemes(true).take(SHORT_LABEL_LENGTH).collect()
}
