//! Converts raw store records into canonical transactions.

use std::{collections::HashSet, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use rule_domain::{BudgetBucket, RawTransaction, Transaction, TransactionKind};

use crate::time::Clock;

/// Category assigned when a record carries no usable category label.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Something the normalizer had to guess or discard while canonicalizing a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationWarning {
    IdSynthesized { index: usize, id: String },
    AmountDefaulted { id: String },
    AmountClamped { id: String },
    /// The date was missing or unparseable and the processing date was used.
    DateDefaulted { id: String, fallback: NaiveDate },
    /// The record's type is neither income nor expense; it was dropped.
    UnknownKind { index: usize },
    UnknownBucket { id: String },
    BucketIgnored { id: String },
    CategoryDefaulted { id: String },
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationWarning::IdSynthesized { index, id } => {
                write!(f, "record #{index} had no id; assigned {id}")
            }
            NormalizationWarning::AmountDefaulted { id } => {
                write!(f, "transaction {id} has a missing or unparseable amount; using 0")
            }
            NormalizationWarning::AmountClamped { id } => {
                write!(f, "transaction {id} has a negative amount; using 0")
            }
            NormalizationWarning::DateDefaulted { id, fallback } => {
                write!(f, "transaction {id} has a missing or unparseable date; using {fallback}")
            }
            NormalizationWarning::UnknownKind { index } => {
                write!(f, "record #{index} is neither Income nor Expense; skipped")
            }
            NormalizationWarning::UnknownBucket { id } => {
                write!(f, "transaction {id} has an unknown budget type; left unclassified")
            }
            NormalizationWarning::BucketIgnored { id } => {
                write!(f, "income transaction {id} carries a budget type; ignored")
            }
            NormalizationWarning::CategoryDefaulted { id } => {
                write!(f, "transaction {id} has no category; using {UNCATEGORIZED}")
            }
        }
    }
}

/// Canonical transactions plus every warning raised while producing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<NormalizationWarning>,
}

impl NormalizedBatch {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Pure, total conversion from [`RawTransaction`] to [`Transaction`].
pub struct NormalizeService;

impl NormalizeService {
    /// Normalizes a batch of raw records. Never fails: malformed fields fall
    /// back to safe defaults and are reported as warnings.
    pub fn normalize(records: &[RawTransaction], clock: &dyn Clock) -> NormalizedBatch {
        let today = clock.today();
        let mut seen_ids = HashSet::new();
        let mut batch = NormalizedBatch::default();

        for (index, record) in records.iter().enumerate() {
            if let Some(txn) =
                normalize_record(index, record, today, &mut seen_ids, &mut batch.warnings)
            {
                batch.transactions.push(txn);
            }
        }

        for warning in &batch.warnings {
            warn!(%warning, "normalization fallback applied");
        }
        debug!(
            records = records.len(),
            transactions = batch.transactions.len(),
            "normalized transaction batch"
        );
        batch
    }
}

fn normalize_record(
    index: usize,
    record: &RawTransaction,
    today: NaiveDate,
    seen_ids: &mut HashSet<String>,
    warnings: &mut Vec<NormalizationWarning>,
) -> Option<Transaction> {
    let kind = record
        .kind
        .as_ref()
        .and_then(text_of)
        .and_then(|label| TransactionKind::parse(&label));
    let Some(kind) = kind else {
        warnings.push(NormalizationWarning::UnknownKind { index });
        return None;
    };

    let id = match record.record_id() {
        Some(id) => {
            seen_ids.insert(id.clone());
            id
        }
        None => {
            let id = synthesize_id(seen_ids);
            warnings.push(NormalizationWarning::IdSynthesized {
                index,
                id: id.clone(),
            });
            id
        }
    };

    let amount = match record.amount.as_ref().and_then(parse_amount) {
        Some(amount) if amount < Decimal::ZERO => {
            warnings.push(NormalizationWarning::AmountClamped { id: id.clone() });
            Decimal::ZERO
        }
        Some(amount) => amount,
        None => {
            warnings.push(NormalizationWarning::AmountDefaulted { id: id.clone() });
            Decimal::ZERO
        }
    };

    let occurred_on = record.date.as_ref().and_then(parse_date).unwrap_or_else(|| {
        warnings.push(NormalizationWarning::DateDefaulted {
            id: id.clone(),
            fallback: today,
        });
        today
    });

    let category = match record.category.as_ref().and_then(text_of) {
        Some(category) => category,
        None => {
            warnings.push(NormalizationWarning::CategoryDefaulted { id: id.clone() });
            UNCATEGORIZED.to_string()
        }
    };

    let bucket_label = record.budget_type.as_ref().and_then(text_of);
    let bucket = match (kind, bucket_label) {
        (_, None) => None,
        (TransactionKind::Income, Some(_)) => {
            warnings.push(NormalizationWarning::BucketIgnored { id: id.clone() });
            None
        }
        (TransactionKind::Expense, Some(label)) => {
            let parsed = BudgetBucket::parse(&label);
            if parsed.is_none() {
                warnings.push(NormalizationWarning::UnknownBucket { id: id.clone() });
            }
            parsed
        }
    };

    let note = record.note.as_ref().and_then(text_of).unwrap_or_default();

    Some(Transaction {
        id,
        kind,
        category,
        amount,
        occurred_on,
        note,
        bucket,
    })
}

fn synthesize_id(seen_ids: &mut HashSet<String>) -> String {
    loop {
        let candidate = Uuid::new_v4().to_string();
        if seen_ids.insert(candidate.clone()) {
            return candidate;
        }
    }
}

/// Trimmed, non-empty text for string and scalar JSON values.
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .ok()
        }
        _ => None,
    }
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(text) => parse_date_text(text.trim()),
        Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|timestamp| timestamp.date_naive()),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn raw(value: Value) -> RawTransaction {
        serde_json::from_value(value).expect("raw record")
    }

    fn normalize(records: &[RawTransaction]) -> NormalizedBatch {
        NormalizeService::normalize(records, &FixedClock(today()))
    }

    #[test]
    fn well_formed_record_passes_through() {
        let batch = normalize(&[raw(json!({
            "_id": "a1",
            "type": "Expense",
            "category": "  Groceries ",
            "amount": 45.5,
            "date": "2024-02-03T10:15:00.000Z",
            "note": " weekly ",
            "budgetType": "Needs"
        }))]);

        assert!(!batch.has_warnings(), "{:?}", batch.warnings);
        let txn = &batch.transactions[0];
        assert_eq!(txn.id, "a1");
        assert_eq!(txn.kind, TransactionKind::Expense);
        assert_eq!(txn.category, "Groceries");
        assert_eq!(txn.amount, dec!(45.5));
        assert_eq!(txn.occurred_on, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert_eq!(txn.note, "weekly");
        assert_eq!(txn.bucket, Some(BudgetBucket::Needs));
    }

    #[test]
    fn garbage_amount_and_date_fall_back_with_warnings() {
        let batch = normalize(&[raw(json!({
            "id": "b2",
            "type": "Income",
            "category": "Salary",
            "amount": "lots",
            "date": "not a date"
        }))]);

        let txn = &batch.transactions[0];
        assert_eq!(txn.amount, Decimal::ZERO);
        assert_eq!(txn.occurred_on, today());
        assert_eq!(txn.note, "");
        assert!(batch
            .warnings
            .contains(&NormalizationWarning::AmountDefaulted { id: "b2".into() }));
        assert!(batch.warnings.contains(&NormalizationWarning::DateDefaulted {
            id: "b2".into(),
            fallback: today(),
        }));
    }

    #[test]
    fn missing_ids_are_synthesized_uniquely() {
        let records: Vec<_> = (0..50)
            .map(|_| raw(json!({ "type": "Expense", "category": "Misc", "amount": 1 })))
            .collect();
        let batch = normalize(&records);

        let ids: HashSet<_> = batch.transactions.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), 50);
        assert!(ids.iter().all(|id| !id.is_empty()));
    }

    #[test]
    fn numeric_strings_and_epoch_dates_are_accepted() {
        let batch = normalize(&[raw(json!({
            "id": "c3",
            "type": "expense",
            "category": "Fuel",
            "amount": " 1200.75 ",
            "date": 1_706_745_600_000_i64
        }))]);

        let txn = &batch.transactions[0];
        assert_eq!(txn.amount, dec!(1200.75));
        assert_eq!(txn.occurred_on, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn negative_amounts_are_clamped_to_zero() {
        let batch = normalize(&[raw(json!({
            "id": "d4", "type": "Expense", "category": "Refund", "amount": -30, "date": "2024-01-01"
        }))]);
        assert_eq!(batch.transactions[0].amount, Decimal::ZERO);
        assert_eq!(
            batch.warnings,
            vec![NormalizationWarning::AmountClamped { id: "d4".into() }]
        );
    }

    #[test]
    fn unknown_kinds_are_skipped_without_aborting_the_batch() {
        let batch = normalize(&[
            raw(json!({ "id": "e5", "type": "Transfer", "amount": 10 })),
            raw(json!({ "id": "e6", "type": "Income", "category": "Gift", "amount": 10, "date": "2024-01-01" })),
        ]);
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].id, "e6");
        assert!(batch
            .warnings
            .contains(&NormalizationWarning::UnknownKind { index: 0 }));
    }

    #[test]
    fn buckets_are_dropped_for_income_and_unknown_labels() {
        let batch = normalize(&[
            raw(json!({ "id": "f1", "type": "Income", "category": "Pay", "amount": 5, "date": "2024-01-01", "budgetType": "Needs" })),
            raw(json!({ "id": "f2", "type": "Expense", "category": "Toys", "amount": 5, "date": "2024-01-01", "budgetType": "Luxury" })),
        ]);
        assert!(batch.transactions.iter().all(|t| t.bucket.is_none()));
        assert!(batch
            .warnings
            .contains(&NormalizationWarning::BucketIgnored { id: "f1".into() }));
        assert!(batch
            .warnings
            .contains(&NormalizationWarning::UnknownBucket { id: "f2".into() }));
    }

    #[test]
    fn empty_category_defaults_to_uncategorized() {
        let batch = normalize(&[raw(json!({
            "id": "g7", "type": "Expense", "category": "   ", "amount": 3, "date": "2024-01-01"
        }))]);
        assert_eq!(batch.transactions[0].category, UNCATEGORIZED);
    }
}
