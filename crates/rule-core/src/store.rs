//! Contracts for the external transaction and rule stores.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use rule_domain::{AllocationRule, BudgetBucket, RawTransaction, TransactionKind};

use crate::CoreError;

/// Body sent to the transaction store on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionPayload {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
    #[serde(rename = "budgetType", default, skip_serializing_if = "Option::is_none")]
    pub budget_type: Option<BudgetBucket>,
}

impl TransactionPayload {
    /// Converts the payload into a store record carrying `id`.
    pub fn to_raw(&self, id: &str) -> RawTransaction {
        let amount = Number::from_str(&self.amount.to_string())
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(self.amount.to_string()));
        RawTransaction {
            id: Some(Value::String(id.to_string())),
            object_id: None,
            kind: Some(Value::String(self.kind.label().to_string())),
            category: Some(Value::String(self.category.clone())),
            amount: Some(amount),
            date: Some(Value::String(self.date.format("%Y-%m-%d").to_string())),
            note: Some(Value::String(self.note.clone())),
            budget_type: self
                .budget_type
                .map(|bucket| Value::String(bucket.label().to_string())),
        }
    }
}

/// CRUD access to persisted transactions.
///
/// Mutations are fire-and-forget: callers re-derive state from a fresh
/// [`TransactionStore::list_transactions`] rather than patching their own copy.
pub trait TransactionStore: Send + Sync {
    fn list_transactions(&self) -> Result<Vec<RawTransaction>, CoreError>;
    fn create_transaction(&self, payload: &TransactionPayload) -> Result<(), CoreError>;
    fn update_transaction(&self, id: &str, patch: &TransactionPayload) -> Result<(), CoreError>;
    fn delete_transaction(&self, id: &str) -> Result<(), CoreError>;
}

/// Access to the persisted allocation rule.
pub trait RuleStore: Send + Sync {
    fn get_rule(&self) -> Result<AllocationRule, CoreError>;
    fn update_rule(&self, rule: &AllocationRule) -> Result<(), CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn raw_record_uses_store_field_names() {
        let payload = TransactionPayload {
            kind: TransactionKind::Expense,
            category: "Rent".into(),
            amount: dec!(1200.50),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            note: String::new(),
            budget_type: Some(BudgetBucket::Needs),
        };
        let value = serde_json::to_value(payload.to_raw("t-1")).unwrap();
        assert_eq!(value["id"], json!("t-1"));
        assert_eq!(value["type"], json!("Expense"));
        assert_eq!(value["amount"], json!(1200.5));
        assert_eq!(value["date"], json!("2024-02-01"));
        assert_eq!(value["budgetType"], json!("Needs"));
        assert!(value.get("_id").is_none());
    }
}
