use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::MonthKey;

/// Direction of money flow for a transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Parses the external `type` label, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Budget bucket an expense is classified into.
///
/// Expenses carry an `Option<BudgetBucket>`; `None` is the unclassified state and
/// is excluded from every bucket total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BudgetBucket {
    Needs,
    Wants,
    Savings,
}

impl BudgetBucket {
    pub const ALL: [BudgetBucket; 3] = [
        BudgetBucket::Needs,
        BudgetBucket::Wants,
        BudgetBucket::Savings,
    ];

    /// Parses the external `budgetType` label, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "needs" => Some(BudgetBucket::Needs),
            "wants" => Some(BudgetBucket::Wants),
            "savings" => Some(BudgetBucket::Savings),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BudgetBucket::Needs => "Needs",
            BudgetBucket::Wants => "Wants",
            BudgetBucket::Savings => "Savings",
        }
    }
}

impl fmt::Display for BudgetBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical, immutable transaction record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub occurred_on: NaiveDate,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<BudgetBucket>,
}

impl Transaction {
    /// Builds a transaction with a fresh identifier.
    ///
    /// Negative amounts are clamped to zero and the bucket is dropped for income.
    pub fn new(
        kind: TransactionKind,
        category: impl Into<String>,
        amount: Decimal,
        occurred_on: NaiveDate,
        bucket: Option<BudgetBucket>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            category: category.into().trim().to_string(),
            amount: amount.max(Decimal::ZERO),
            occurred_on,
            note: String::new(),
            bucket: match kind {
                TransactionKind::Income => None,
                TransactionKind::Expense => bucket,
            },
        }
    }

    pub fn income(category: impl Into<String>, amount: Decimal, occurred_on: NaiveDate) -> Self {
        Self::new(TransactionKind::Income, category, amount, occurred_on, None)
    }

    pub fn expense(
        category: impl Into<String>,
        amount: Decimal,
        occurred_on: NaiveDate,
        bucket: Option<BudgetBucket>,
    ) -> Self {
        Self::new(TransactionKind::Expense, category, amount, occurred_on, bucket)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into().trim().to_string();
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Calendar month the transaction is bucketed into.
    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.occurred_on)
    }

    /// Amount with sign applied: positive for income, negative for expenses.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}
