use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use rule_domain::{MonthKey, Transaction};

use crate::time::Clock;

/// Time range a report is computed over.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeWindow {
    All,
    Month(MonthKey),
}

impl TimeWindow {
    /// The calendar month containing the clock's current date.
    pub fn current(clock: &dyn Clock) -> Self {
        TimeWindow::Month(MonthKey::from_date(clock.today()))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            TimeWindow::All => true,
            TimeWindow::Month(month) => month.contains(date),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::All => f.write_str("All time"),
            TimeWindow::Month(month) => f.write_str(&month.label()),
        }
    }
}

/// Selects transaction subsequences by calendar window, preserving order.
pub struct WindowService;

impl WindowService {
    /// Transactions whose date falls in `year`/`month`. An out-of-range month
    /// selects nothing.
    pub fn select_month(transactions: &[Transaction], year: i32, month: u32) -> Vec<&Transaction> {
        match MonthKey::new(year, month) {
            Some(key) => Self::select(transactions, TimeWindow::Month(key)),
            None => Vec::new(),
        }
    }

    /// Identity selection for the "all time" mode.
    pub fn select_all(transactions: &[Transaction]) -> Vec<&Transaction> {
        transactions.iter().collect()
    }

    pub fn select(transactions: &[Transaction], window: TimeWindow) -> Vec<&Transaction> {
        transactions
            .iter()
            .filter(|txn| window.contains(txn.occurred_on))
            .collect()
    }
}
