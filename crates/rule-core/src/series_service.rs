use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use rule_domain::{MonthKey, Transaction};
use tracing::warn;

use crate::{
    aggregate_service::AggregateService,
    window_service::{TimeWindow, WindowService},
};

pub const DEFAULT_TRAILING_MONTHS: usize = 6;
/// Longest series the dashboard will build.
pub const MAX_TRAILING_MONTHS: usize = 120;

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyPoint {
    pub month: MonthKey,
    pub label: String,
    pub income_total: Decimal,
    pub expense_total: Decimal,
}

pub struct SeriesService;

impl SeriesService {
    /// Builds `months` points, oldest first, ending with the month containing `anchor`.
    ///
    /// Counts above [`MAX_TRAILING_MONTHS`] yield an empty series.
    pub fn build_trailing_months(
        transactions: &[Transaction],
        months: usize,
        anchor: NaiveDate,
    ) -> Vec<MonthlyPoint> {
        let span = match i64::try_from(months) {
            Ok(span) if months <= MAX_TRAILING_MONTHS => span,
            _ => {
                warn!(months, max = MAX_TRAILING_MONTHS, "trailing series too long");
                return Vec::new();
            }
        };
        let anchor_month = MonthKey::from_date(anchor);
        (0..span)
            .map(|index| {
                let month = anchor_month.shift(index + 1 - span);
                let selected = WindowService::select(transactions, TimeWindow::Month(month));
                let aggregate = AggregateService::aggregate(selected);
                MonthlyPoint {
                    month,
                    label: month.label(),
                    income_total: aggregate.income_total,
                    expense_total: aggregate.expense_total,
                }
            })
            .collect()
    }
}
