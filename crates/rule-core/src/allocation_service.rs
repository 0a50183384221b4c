//! Evaluates bucket spending against a percentage allocation rule.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use rule_domain::{AllocationRule, BudgetBucket};

use crate::aggregate_service::BucketTotals;

/// Upper bound for `percent_used`; keeps progress displays bounded.
pub const PERCENT_USED_CAP: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

/// Limit, spend and headroom for one bucket.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BucketStatus {
    pub bucket: BudgetBucket,
    pub percent: Decimal,
    pub limit: Decimal,
    pub spent: Decimal,
    /// `spent / limit * 100`, capped at [`PERCENT_USED_CAP`]; zero when the limit is zero.
    pub percent_used: Decimal,
    /// `limit - spent` for Needs and Wants (positive is under budget);
    /// `spent - limit` for Savings (positive is above the savings target).
    pub remaining: Decimal,
}

impl BucketStatus {
    /// Spending bucket over its limit, or savings bucket short of its target.
    pub fn is_off_track(&self) -> bool {
        self.remaining < Decimal::ZERO
    }
}

/// Allocation computed for an active rule.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AllocationStatus {
    pub rule: AllocationRule,
    pub income_total: Decimal,
    pub needs: BucketStatus,
    pub wants: BucketStatus,
    pub savings: BucketStatus,
}

impl AllocationStatus {
    pub fn bucket(&self, bucket: BudgetBucket) -> &BucketStatus {
        match bucket {
            BudgetBucket::Needs => &self.needs,
            BudgetBucket::Wants => &self.wants,
            BudgetBucket::Savings => &self.savings,
        }
    }

    pub fn buckets(&self) -> [&BucketStatus; 3] {
        [&self.needs, &self.wants, &self.savings]
    }
}

/// Result of evaluating a rule: either computed statuses or an inactive rule.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AllocationOutcome {
    Active(AllocationStatus),
    /// Shares do not sum to 100 (or one is negative); nothing was computed.
    RuleInvalid { rule: AllocationRule, total: Decimal },
}

impl AllocationOutcome {
    pub fn status(&self) -> Option<&AllocationStatus> {
        match self {
            AllocationOutcome::Active(status) => Some(status),
            AllocationOutcome::RuleInvalid { .. } => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AllocationOutcome::Active(_))
    }
}

pub struct AllocationService;

impl AllocationService {
    pub fn evaluate(
        rule: &AllocationRule,
        income_total: Decimal,
        by_bucket: &BucketTotals,
    ) -> AllocationOutcome {
        if !rule.is_complete() {
            warn!(
                needs = %rule.needs,
                wants = %rule.wants,
                savings = %rule.savings,
                "allocation rule inactive: shares must be non-negative and sum to 100"
            );
            return AllocationOutcome::RuleInvalid {
                rule: *rule,
                total: rule.total(),
            };
        }

        let status_for = |bucket| Self::bucket_status(rule, income_total, by_bucket, bucket);
        AllocationOutcome::Active(AllocationStatus {
            rule: *rule,
            income_total,
            needs: status_for(BudgetBucket::Needs),
            wants: status_for(BudgetBucket::Wants),
            savings: status_for(BudgetBucket::Savings),
        })
    }

    fn bucket_status(
        rule: &AllocationRule,
        income_total: Decimal,
        by_bucket: &BucketTotals,
        bucket: BudgetBucket,
    ) -> BucketStatus {
        let percent = rule.percent_for(bucket);
        let limit = limit_for(income_total, percent);
        let spent = by_bucket.get(bucket);
        let remaining = match bucket {
            BudgetBucket::Needs | BudgetBucket::Wants => limit.saturating_sub(spent),
            BudgetBucket::Savings => spent.saturating_sub(limit),
        };
        BucketStatus {
            bucket,
            percent,
            limit,
            spent,
            percent_used: percent_used(spent, limit),
            remaining,
        }
    }
}

fn limit_for(income_total: Decimal, percent: Decimal) -> Decimal {
    income_total
        .checked_mul(percent)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .unwrap_or_else(|| income_total.saturating_mul(percent / Decimal::ONE_HUNDRED))
}

fn percent_used(spent: Decimal, limit: Decimal) -> Decimal {
    if limit.is_zero() {
        return Decimal::ZERO;
    }
    spent
        .checked_div(limit)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(PERCENT_USED_CAP, |used| used.min(PERCENT_USED_CAP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spent(needs: Decimal, wants: Decimal, savings: Decimal) -> BucketTotals {
        BucketTotals {
            needs,
            wants,
            savings,
        }
    }

    #[test]
    fn fifty_thirty_twenty_scenario() {
        let outcome = AllocationService::evaluate(
            &AllocationRule::new(50, 30, 20),
            dec!(10000),
            &spent(dec!(4000), Decimal::ZERO, Decimal::ZERO),
        );
        let status = outcome.status().expect("rule is active");
        assert_eq!(status.needs.limit, dec!(5000));
        assert_eq!(status.needs.percent_used, dec!(80));
        assert_eq!(status.needs.remaining, dec!(1000));
        assert_eq!(status.wants.limit, dec!(3000));
        assert_eq!(status.savings.limit, dec!(2000));
    }

    #[test]
    fn savings_remaining_has_inverted_polarity() {
        // income 5000 at 20% gives limit 1000 for both needs (20) and savings (20)
        let rule = AllocationRule::new(20, 60, 20);
        let outcome = AllocationService::evaluate(
            &rule,
            dec!(5000),
            &spent(dec!(1200), Decimal::ZERO, dec!(1200)),
        );
        let status = outcome.status().unwrap();
        assert_eq!(status.needs.limit, dec!(1000));
        assert_eq!(status.needs.remaining, dec!(-200));
        assert!(status.needs.is_off_track());
        assert_eq!(status.savings.limit, dec!(1000));
        assert_eq!(status.savings.remaining, dec!(200));
        assert!(!status.savings.is_off_track());
    }

    #[test]
    fn invalid_rule_is_reported_distinctly() {
        let rule = AllocationRule::new(50, 30, 30);
        let outcome = AllocationService::evaluate(&rule, dec!(1000), &BucketTotals::default());
        assert_eq!(
            outcome,
            AllocationOutcome::RuleInvalid {
                rule,
                total: dec!(110)
            }
        );
        assert!(outcome.status().is_none());
    }

    #[test]
    fn zero_income_never_divides_by_zero() {
        let outcome = AllocationService::evaluate(
            &AllocationRule::default(),
            Decimal::ZERO,
            &spent(dec!(25), dec!(10), Decimal::ZERO),
        );
        let status = outcome.status().unwrap();
        for bucket in status.buckets() {
            assert_eq!(bucket.limit, Decimal::ZERO);
            assert_eq!(bucket.percent_used, Decimal::ZERO);
        }
        assert_eq!(status.needs.remaining, dec!(-25));
    }

    #[test]
    fn percent_used_is_capped() {
        let outcome = AllocationService::evaluate(
            &AllocationRule::default(),
            dec!(1000),
            &spent(dec!(5000), dec!(300), Decimal::ZERO),
        );
        let status = outcome.status().unwrap();
        assert_eq!(status.needs.percent_used, PERCENT_USED_CAP);
        assert_eq!(status.wants.percent_used, dec!(100));
        assert_eq!(status.needs.remaining, dec!(-4500));
    }
}
