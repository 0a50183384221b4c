use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{
    AggregateService, AllocationOutcome, AllocationService, BalanceCheck, BucketTotals, Clock,
    CoreError, FixedClock, RuleService, RuleStore, RuleUpdate, SeriesService, SubmitOutcome,
    TransactionDraft, TransactionPayload, TransactionService, TransactionStore, PERCENT_USED_CAP,
};
use rule_domain::{AllocationRule, BudgetBucket, RawTransaction, Transaction, TransactionKind};

#[derive(Default)]
struct MemoryStore {
    records: Mutex<Vec<RawTransaction>>,
    rule: Mutex<Option<AllocationRule>>,
    fail: bool,
}

impl MemoryStore {
    fn unreachable() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn guard(&self) -> Result<(), CoreError> {
        if self.fail {
            Err(CoreError::Storage("store unreachable".into()))
        } else {
            Ok(())
        }
    }
}

impl TransactionStore for MemoryStore {
    fn list_transactions(&self) -> Result<Vec<RawTransaction>, CoreError> {
        self.guard()?;
        Ok(self.records.lock().unwrap().clone())
    }

    fn create_transaction(&self, payload: &TransactionPayload) -> Result<(), CoreError> {
        self.guard()?;
        let mut records = self.records.lock().unwrap();
        let id = format!("mem-{}", records.len() + 1);
        records.push(payload.to_raw(&id));
        Ok(())
    }

    fn update_transaction(&self, id: &str, patch: &TransactionPayload) -> Result<(), CoreError> {
        self.guard()?;
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|record| record.record_id().as_deref() == Some(id))
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        *slot = patch.to_raw(id);
        Ok(())
    }

    fn delete_transaction(&self, id: &str) -> Result<(), CoreError> {
        self.guard()?;
        self.records
            .lock()
            .unwrap()
            .retain(|record| record.record_id().as_deref() != Some(id));
        Ok(())
    }
}

impl RuleStore for MemoryStore {
    fn get_rule(&self) -> Result<AllocationRule, CoreError> {
        self.guard()?;
        Ok(self.rule.lock().unwrap().unwrap_or_default())
    }

    fn update_rule(&self, rule: &AllocationRule) -> Result<(), CoreError> {
        self.guard()?;
        *self.rule.lock().unwrap() = Some(*rule);
        Ok(())
    }
}

fn clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap())
}

fn draft(kind: TransactionKind, amount: Decimal) -> TransactionDraft {
    TransactionDraft {
        kind,
        category: "General".into(),
        amount,
        date: clock().today(),
        note: None,
        bucket: Some(BudgetBucket::Needs),
    }
}

#[test]
fn any_rule_not_summing_to_one_hundred_is_invalid() {
    let spends = [
        BucketTotals::default(),
        BucketTotals {
            needs: dec!(999),
            wants: dec!(1),
            savings: dec!(0),
        },
    ];
    for (needs, wants, savings) in [(0, 0, 0), (50, 30, 19), (50, 30, 21), (100, 100, 100)] {
        let rule = AllocationRule::new(needs, wants, savings);
        for income in [Decimal::ZERO, dec!(1), dec!(123456.78)] {
            for spend in &spends {
                assert!(matches!(
                    AllocationService::evaluate(&rule, income, spend),
                    AllocationOutcome::RuleInvalid { .. }
                ));
            }
        }
    }
}

#[test]
fn percent_used_stays_within_bounds() {
    let rule = AllocationRule::new(dec!(33.3), dec!(33.3), dec!(33.4));
    for income in [Decimal::ZERO, dec!(0.01), dec!(10), dec!(99999)] {
        for spent in [Decimal::ZERO, dec!(0.01), dec!(3.33), dec!(1000000)] {
            let totals = BucketTotals {
                needs: spent,
                wants: spent,
                savings: spent,
            };
            let outcome = AllocationService::evaluate(&rule, income, &totals);
            for bucket in outcome.status().unwrap().buckets() {
                assert!(bucket.percent_used >= Decimal::ZERO);
                assert!(bucket.percent_used <= PERCENT_USED_CAP);
            }
        }
    }
}

#[test]
fn bucket_sum_never_exceeds_expense_total() {
    let day = clock().today();
    let classified = vec![
        Transaction::expense("Rent", dec!(10), day, Some(BudgetBucket::Needs)),
        Transaction::expense("Games", dec!(5), day, Some(BudgetBucket::Wants)),
    ];
    let aggregate = AggregateService::aggregate(&classified);
    assert_eq!(aggregate.by_bucket.total(), aggregate.expense_total);

    let mut mixed = classified;
    mixed.push(Transaction::expense("Unknown", dec!(1), day, None));
    let aggregate = AggregateService::aggregate(&mixed);
    assert!(aggregate.by_bucket.total() < aggregate.expense_total);
}

#[test]
fn trailing_series_labels_cross_year_boundary() {
    let anchor = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
    let labels: Vec<_> = SeriesService::build_trailing_months(&[], 6, anchor)
        .into_iter()
        .map(|point| point.label)
        .collect();
    assert_eq!(labels.first().map(String::as_str), Some("Sep 2023"));
    assert_eq!(labels.last().map(String::as_str), Some("Feb 2024"));
}

#[test]
fn submit_creates_and_reloads_through_store() {
    let store = MemoryStore::default();
    let outcome = TransactionService::submit(
        &store,
        &[],
        &draft(TransactionKind::Income, dec!(1000)),
        None,
    )
    .expect("submit income");
    assert_eq!(outcome, SubmitOutcome::Created);

    let batch = TransactionService::load(&store, &clock()).expect("load");
    assert_eq!(batch.transactions.len(), 1);
    let income = &batch.transactions[0];
    assert_eq!(income.amount, dec!(1000));
    assert_eq!(income.bucket, None, "income payloads drop the bucket");
}

#[test]
fn submit_rejects_new_expense_over_balance_but_allows_edits() {
    let store = MemoryStore::default();
    let current = vec![Transaction::income("Salary", dec!(500), clock().today()).with_id("pay")];

    let rejected = TransactionService::submit(
        &store,
        &current,
        &draft(TransactionKind::Expense, dec!(500.01)),
        None,
    )
    .expect("submit");
    assert_eq!(
        rejected,
        SubmitOutcome::Rejected(BalanceCheck::Rejected {
            balance: dec!(500),
            requested: dec!(500.01),
        })
    );
    assert!(store.list_transactions().unwrap().is_empty());

    let exact = TransactionService::submit(
        &store,
        &current,
        &draft(TransactionKind::Expense, dec!(500)),
        None,
    )
    .expect("submit");
    assert_eq!(exact, SubmitOutcome::Created);

    let edited = TransactionService::submit(
        &store,
        &current,
        &draft(TransactionKind::Expense, dec!(9000)),
        Some("mem-1"),
    )
    .expect("edit");
    assert_eq!(edited, SubmitOutcome::Updated { id: "mem-1".into() });
}

#[test]
fn submit_validates_drafts() {
    let store = MemoryStore::default();
    let mut blank = draft(TransactionKind::Income, dec!(10));
    blank.category = "   ".into();
    assert!(matches!(
        TransactionService::submit(&store, &[], &blank, None),
        Err(CoreError::Validation(_))
    ));
    assert!(matches!(
        TransactionService::submit(&store, &[], &draft(TransactionKind::Income, Decimal::ZERO), None),
        Err(CoreError::Validation(_))
    ));
}

#[test]
fn rule_is_persisted_only_when_complete() {
    let store = MemoryStore::default();
    let invalid = AllocationRule::new(60, 30, 20);
    assert_eq!(
        RuleService::apply(&store, invalid).unwrap(),
        RuleUpdate::Rejected {
            rule: invalid,
            total: dec!(110)
        }
    );
    assert_eq!(RuleService::load(&store).unwrap(), AllocationRule::default());

    let valid = AllocationRule::new(60, 20, 20);
    assert_eq!(
        RuleService::apply(&store, valid).unwrap(),
        RuleUpdate::Persisted(valid)
    );
    assert_eq!(RuleService::load(&store).unwrap(), valid);
}

#[test]
fn collaborator_failures_propagate_unchanged() {
    let store = MemoryStore::unreachable();
    assert!(matches!(
        TransactionService::load(&store, &clock()),
        Err(CoreError::Storage(_))
    ));
    assert!(matches!(
        RuleService::apply(&store, AllocationRule::default()),
        Err(CoreError::Storage(_))
    ));
}
