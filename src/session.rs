//! Stateful wrapper around the dashboard pipeline.

use chrono::NaiveDate;
use rule_config::{Config, WindowMode};
use rule_core::{
    BalanceService, Clock, CoreError, DashboardInput, DashboardReport, DashboardService,
    NormalizationWarning, RuleService, RuleStore, RuleUpdate, SubmitOutcome, TimeWindow,
    TransactionDraft, TransactionService, TransactionStore, DEFAULT_RECENT_LIMIT,
    DEFAULT_TRAILING_MONTHS,
};
use rule_domain::{AllocationRule, Transaction, TransactionKind};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Report parameters that persist across refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// `None` follows the clock's current month on every refresh.
    pub window: Option<TimeWindow>,
    pub trailing_months: usize,
    pub recent_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            window: None,
            trailing_months: DEFAULT_TRAILING_MONTHS,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        let window = match config.default_window {
            WindowMode::Current => None,
            WindowMode::All => Some(TimeWindow::All),
        };
        Self {
            window,
            trailing_months: config.trailing_months,
            recent_limit: config.recent_limit,
        }
    }
}

/// Holds the stores plus the last report that was built successfully.
///
/// A failed refresh leaves the previous report, transactions and warnings in
/// place so callers can keep showing the last-known-good state.
pub struct DashboardSession {
    transactions: Box<dyn TransactionStore>,
    rules: Box<dyn RuleStore>,
    clock: Box<dyn Clock>,
    options: SessionOptions,
    current: Vec<Transaction>,
    warnings: Vec<NormalizationWarning>,
    report: Option<DashboardReport>,
}

impl DashboardSession {
    pub fn new(
        transactions: Box<dyn TransactionStore>,
        rules: Box<dyn RuleStore>,
        clock: Box<dyn Clock>,
        options: SessionOptions,
    ) -> Self {
        Self {
            transactions,
            rules,
            clock,
            options,
            current: Vec::new(),
            warnings: Vec::new(),
            report: None,
        }
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Replaces the options; takes effect on the next refresh.
    pub fn set_options(&mut self, options: SessionOptions) {
        self.options = options;
    }

    pub fn report(&self) -> Option<&DashboardReport> {
        self.report.as_ref()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.current
    }

    pub fn warnings(&self) -> &[NormalizationWarning] {
        &self.warnings
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.current.iter().find(|txn| txn.id == id)
    }

    /// All-time balance of the last loaded transactions.
    pub fn balance(&self) -> Decimal {
        BalanceService::current_balance(&self.current)
    }

    /// Balance left if an expense of `amount` were added. `None` for income.
    pub fn live_remaining(&self, amount: Decimal, kind: TransactionKind) -> Option<Decimal> {
        BalanceService::live_remaining(self.balance(), amount, kind)
    }

    /// Re-lists both stores and rebuilds the report.
    pub fn refresh(&mut self) -> Result<&DashboardReport, CoreError> {
        let loaded = TransactionService::load(self.transactions.as_ref(), self.clock.as_ref())
            .and_then(|batch| Ok((batch, RuleService::load(self.rules.as_ref())?)));
        let (batch, rule) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(
                    error = %err,
                    kept_previous = self.report.is_some(),
                    "dashboard refresh failed"
                );
                return Err(err);
            }
        };

        let window = self
            .options
            .window
            .unwrap_or_else(|| TimeWindow::current(self.clock.as_ref()));
        let input = DashboardInput::new(&batch.transactions, rule, self.clock.today())
            .with_window(window)
            .with_trailing_months(self.options.trailing_months)
            .with_recent_limit(self.options.recent_limit);
        let report = DashboardService::build(&input);
        debug!(
            transactions = batch.transactions.len(),
            warnings = batch.warnings.len(),
            %window,
            "dashboard refreshed"
        );

        self.current = batch.transactions;
        self.warnings = batch.warnings;
        Ok(self.report.insert(report))
    }

    /// Submits a draft, then refreshes unless the balance guard rejected it.
    pub fn submit(
        &mut self,
        draft: &TransactionDraft,
        editing: Option<&str>,
    ) -> Result<SubmitOutcome, CoreError> {
        if self.report.is_none() {
            self.refresh()?;
        }
        let outcome =
            TransactionService::submit(self.transactions.as_ref(), &self.current, draft, editing)?;
        if !matches!(outcome, SubmitOutcome::Rejected(_)) {
            self.refresh()?;
        }
        Ok(outcome)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), CoreError> {
        TransactionService::delete(self.transactions.as_ref(), id)?;
        self.refresh()?;
        Ok(())
    }

    pub fn rule(&self) -> Result<AllocationRule, CoreError> {
        RuleService::load(self.rules.as_ref())
    }

    /// Persists `rule` when it is complete and refreshes the report.
    pub fn apply_rule(&mut self, rule: AllocationRule) -> Result<RuleUpdate, CoreError> {
        let update = RuleService::apply(self.rules.as_ref(), rule)?;
        if matches!(update, RuleUpdate::Persisted(_)) {
            self.refresh()?;
        }
        Ok(update)
    }
}
