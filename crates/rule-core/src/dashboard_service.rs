//! One-shot pipeline from a transaction snapshot and rule to an immutable report.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use rule_domain::{AllocationRule, MonthKey, Transaction};

use crate::{
    aggregate_service::{AggregateService, CategoryTotal, PeriodAggregate},
    allocation_service::{AllocationOutcome, AllocationService},
    balance_service::BalanceService,
    series_service::{MonthlyPoint, SeriesService, DEFAULT_TRAILING_MONTHS},
    window_service::{TimeWindow, WindowService},
};

pub const DEFAULT_RECENT_LIMIT: usize = 8;

/// Everything the pipeline needs; nothing else is read.
#[derive(Debug, Clone)]
pub struct DashboardInput<'a> {
    pub transactions: &'a [Transaction],
    pub rule: AllocationRule,
    pub anchor: NaiveDate,
    pub window: TimeWindow,
    pub trailing_months: usize,
    pub recent_limit: usize,
}

impl<'a> DashboardInput<'a> {
    /// Defaults to the anchor's month, six trailing months and eight recent rows.
    pub fn new(transactions: &'a [Transaction], rule: AllocationRule, anchor: NaiveDate) -> Self {
        Self {
            transactions,
            rule,
            anchor,
            window: TimeWindow::Month(MonthKey::from_date(anchor)),
            trailing_months: DEFAULT_TRAILING_MONTHS,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_trailing_months(mut self, months: usize) -> Self {
        self.trailing_months = months;
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }
}

/// All-time income, expense and balance.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardReport {
    pub anchor: NaiveDate,
    pub window: TimeWindow,
    pub totals: Totals,
    /// Aggregate restricted to `window`.
    pub period: PeriodAggregate,
    /// `period.by_category` sorted by descending amount.
    pub categories: Vec<CategoryTotal>,
    /// Allocation against the window's income and bucket spend.
    pub allocation: AllocationOutcome,
    pub trend: Vec<MonthlyPoint>,
    /// Most recent transactions first.
    pub recent: Vec<Transaction>,
}

pub struct DashboardService;

impl DashboardService {
    pub fn build(input: &DashboardInput<'_>) -> DashboardReport {
        let all_time = AggregateService::aggregate(input.transactions);
        let totals = Totals {
            income: all_time.income_total,
            expense: all_time.expense_total,
            balance: BalanceService::current_balance(input.transactions),
        };

        let period = AggregateService::aggregate(WindowService::select(
            input.transactions,
            input.window,
        ));
        let allocation =
            AllocationService::evaluate(&input.rule, period.income_total, &period.by_bucket);
        let trend = SeriesService::build_trailing_months(
            input.transactions,
            input.trailing_months,
            input.anchor,
        );

        DashboardReport {
            anchor: input.anchor,
            window: input.window,
            totals,
            categories: period.categories_by_amount(),
            period,
            allocation,
            trend,
            recent: recent(input.transactions, input.recent_limit),
        }
    }
}

fn recent(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.occurred_on.cmp(&a.occurred_on));
    sorted.into_iter().take(limit).cloned().collect()
}
