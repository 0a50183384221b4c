//! Income/expense, per-category and per-bucket totals over a transaction set.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use rule_domain::{BudgetBucket, Transaction, TransactionKind};

/// Summed expense amount for one category.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

/// Expense totals per budget bucket. A bucket with no expenses is zero.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct BucketTotals {
    pub needs: Decimal,
    pub wants: Decimal,
    pub savings: Decimal,
}

impl BucketTotals {
    pub fn get(&self, bucket: BudgetBucket) -> Decimal {
        match bucket {
            BudgetBucket::Needs => self.needs,
            BudgetBucket::Wants => self.wants,
            BudgetBucket::Savings => self.savings,
        }
    }

    fn add(&mut self, bucket: BudgetBucket, amount: Decimal) {
        let slot = match bucket {
            BudgetBucket::Needs => &mut self.needs,
            BudgetBucket::Wants => &mut self.wants,
            BudgetBucket::Savings => &mut self.savings,
        };
        *slot = slot.saturating_add(amount);
    }

    pub fn total(&self) -> Decimal {
        self.needs
            .saturating_add(self.wants)
            .saturating_add(self.savings)
    }
}

/// Totals for a transaction window. Recomputed on demand, never persisted.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PeriodAggregate {
    pub income_total: Decimal,
    pub expense_total: Decimal,
    /// Expense totals per category in first-seen order.
    pub by_category: Vec<CategoryTotal>,
    pub by_bucket: BucketTotals,
    /// Expenses with no bucket; excluded from `by_bucket`.
    pub unclassified_total: Decimal,
}

impl PeriodAggregate {
    pub fn balance(&self) -> Decimal {
        self.income_total.saturating_sub(self.expense_total)
    }

    pub fn category_total(&self, category: &str) -> Decimal {
        self.by_category
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Categories sorted by descending amount; ties keep first-seen order.
    pub fn categories_by_amount(&self) -> Vec<CategoryTotal> {
        let mut sorted = self.by_category.clone();
        sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
        sorted
    }
}

/// Stateless aggregation over transaction snapshots.
pub struct AggregateService;

impl AggregateService {
    pub fn aggregate<'a, I>(transactions: I) -> PeriodAggregate
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut aggregate = PeriodAggregate::default();
        let mut category_index: HashMap<&'a str, usize> = HashMap::new();

        for txn in transactions {
            match txn.kind {
                TransactionKind::Income => {
                    aggregate.income_total = aggregate.income_total.saturating_add(txn.amount);
                }
                TransactionKind::Expense => {
                    aggregate.expense_total = aggregate.expense_total.saturating_add(txn.amount);

                    let slot = *category_index
                        .entry(txn.category.as_str())
                        .or_insert_with(|| {
                            aggregate.by_category.push(CategoryTotal {
                                category: txn.category.clone(),
                                amount: Decimal::ZERO,
                            });
                            aggregate.by_category.len() - 1
                        });
                    let entry = &mut aggregate.by_category[slot];
                    entry.amount = entry.amount.saturating_add(txn.amount);

                    match txn.bucket {
                        Some(bucket) => aggregate.by_bucket.add(bucket, txn.amount),
                        None => {
                            aggregate.unclassified_total =
                                aggregate.unclassified_total.saturating_add(txn.amount)
                        }
                    }
                }
            }
        }
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    fn expense(category: &str, amount: Decimal, bucket: Option<BudgetBucket>) -> Transaction {
        Transaction::expense(category, amount, day(), bucket)
    }

    #[test]
    fn empty_input_yields_zero_totals() {
        let aggregate = AggregateService::aggregate(&Vec::<Transaction>::new());
        assert_eq!(aggregate, PeriodAggregate::default());
        assert!(aggregate.by_category.is_empty());
        assert_eq!(aggregate.by_bucket.total(), Decimal::ZERO);
    }

    #[test]
    fn sums_income_expense_and_categories() {
        let txns = vec![
            Transaction::income("Salary", dec!(3000), day()),
            expense("Rent", dec!(1200), Some(BudgetBucket::Needs)),
            expense("Dining", dec!(80.50), Some(BudgetBucket::Wants)),
            expense("Rent", dec!(100), Some(BudgetBucket::Needs)),
            expense("Index fund", dec!(400), Some(BudgetBucket::Savings)),
        ];
        let aggregate = AggregateService::aggregate(&txns);

        assert_eq!(aggregate.income_total, dec!(3000));
        assert_eq!(aggregate.expense_total, dec!(1780.50));
        assert_eq!(aggregate.balance(), dec!(1219.50));
        assert_eq!(aggregate.category_total("Rent"), dec!(1300));
        assert_eq!(aggregate.by_bucket.needs, dec!(1300));
        assert_eq!(aggregate.by_bucket.wants, dec!(80.50));
        assert_eq!(aggregate.by_bucket.savings, dec!(400));
    }

    #[test]
    fn unclassified_expenses_stay_out_of_buckets() {
        let txns = vec![
            expense("Rent", dec!(500), Some(BudgetBucket::Needs)),
            expense("Mystery", dec!(70), None),
        ];
        let aggregate = AggregateService::aggregate(&txns);

        assert_eq!(aggregate.by_bucket.total(), dec!(500));
        assert_eq!(aggregate.unclassified_total, dec!(70));
        assert!(aggregate.by_bucket.total() < aggregate.expense_total);
    }

    #[test]
    fn category_sort_breaks_ties_by_first_seen() {
        let txns = vec![
            expense("Books", dec!(20), None),
            expense("Coffee", dec!(50), None),
            expense("Apps", dec!(20), None),
            expense("Rent", dec!(900), None),
        ];
        let sorted: Vec<_> = AggregateService::aggregate(&txns)
            .categories_by_amount()
            .into_iter()
            .map(|entry| entry.category)
            .collect();
        assert_eq!(sorted, vec!["Rent", "Coffee", "Books", "Apps"]);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let txns = vec![
            Transaction::income("Salary", dec!(10), day()),
            expense("Food", dec!(4), Some(BudgetBucket::Needs)),
        ];
        assert_eq!(
            AggregateService::aggregate(&txns),
            AggregateService::aggregate(&txns)
        );
    }
}
