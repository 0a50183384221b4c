//! Loading and submitting transactions through the transaction store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use rule_domain::{BudgetBucket, Transaction, TransactionKind};

use crate::{
    balance_service::{BalanceCheck, BalanceService, ExpenseIntent},
    normalize_service::{NormalizeService, NormalizedBatch},
    store::{TransactionPayload, TransactionStore},
    time::Clock,
    CoreError,
};

/// User-entered values for a new or edited transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub bucket: Option<BudgetBucket>,
}

impl TransactionDraft {
    /// Validates the draft and shapes it for the store. The bucket is only
    /// kept for expenses.
    pub fn to_payload(&self) -> Result<TransactionPayload, CoreError> {
        let category = self.category.trim();
        if category.is_empty() {
            return Err(CoreError::Validation("category is required".into()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(CoreError::Validation("amount must be greater than zero".into()));
        }
        Ok(TransactionPayload {
            kind: self.kind,
            category: category.to_string(),
            amount: self.amount,
            date: self.date,
            note: self.note.as_deref().map(str::trim).unwrap_or_default().to_string(),
            budget_type: match self.kind {
                TransactionKind::Expense => self.bucket,
                TransactionKind::Income => None,
            },
        })
    }
}

/// What happened to a submitted draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated { id: String },
    /// The expense would overdraw the balance; nothing was sent to the store.
    Rejected(BalanceCheck),
}

pub struct TransactionService;

impl TransactionService {
    /// Lists and normalizes every stored transaction.
    pub fn load(
        store: &dyn TransactionStore,
        clock: &dyn Clock,
    ) -> Result<NormalizedBatch, CoreError> {
        let records = store.list_transactions()?;
        debug!(records = records.len(), "fetched transaction records");
        Ok(NormalizeService::normalize(&records, clock))
    }

    /// Creates (`editing = None`) or updates a transaction.
    ///
    /// New expenses are checked against the all-time balance of `current`;
    /// edits bypass the guard.
    pub fn submit(
        store: &dyn TransactionStore,
        current: &[Transaction],
        draft: &TransactionDraft,
        editing: Option<&str>,
    ) -> Result<SubmitOutcome, CoreError> {
        let payload = draft.to_payload()?;
        let intent = match editing {
            Some(_) => ExpenseIntent::Edit,
            None => ExpenseIntent::New,
        };
        let balance = BalanceService::current_balance(current);
        let check = BalanceService::check(balance, payload.amount, payload.kind, intent);
        if !check.is_allowed() {
            info!(%balance, requested = %payload.amount, "expense exceeds available balance");
            return Ok(SubmitOutcome::Rejected(check));
        }

        match editing {
            Some(id) => {
                store.update_transaction(id, &payload)?;
                info!(id, "transaction updated");
                Ok(SubmitOutcome::Updated { id: id.to_string() })
            }
            None => {
                store.create_transaction(&payload)?;
                info!(kind = %payload.kind, category = %payload.category, "transaction created");
                Ok(SubmitOutcome::Created)
            }
        }
    }

    pub fn delete(store: &dyn TransactionStore, id: &str) -> Result<(), CoreError> {
        store.delete_transaction(id)?;
        info!(id, "transaction deleted");
        Ok(())
    }
}
