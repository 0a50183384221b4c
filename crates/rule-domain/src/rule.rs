use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::BudgetBucket;

/// Percentage split of income across the three budget buckets.
///
/// The rule is only active when the three shares are non-negative and sum to
/// exactly 100; the allocation engine checks this before computing limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationRule {
    #[serde(alias = "needsPct")]
    pub needs: Decimal,
    #[serde(alias = "wantsPct")]
    pub wants: Decimal,
    #[serde(alias = "savingsPct")]
    pub savings: Decimal,
}

impl AllocationRule {
    pub fn new(
        needs: impl Into<Decimal>,
        wants: impl Into<Decimal>,
        savings: impl Into<Decimal>,
    ) -> Self {
        Self {
            needs: needs.into(),
            wants: wants.into(),
            savings: savings.into(),
        }
    }

    pub fn percent_for(&self, bucket: BudgetBucket) -> Decimal {
        match bucket {
            BudgetBucket::Needs => self.needs,
            BudgetBucket::Wants => self.wants,
            BudgetBucket::Savings => self.savings,
        }
    }

    pub fn total(&self) -> Decimal {
        self.needs
            .saturating_add(self.wants)
            .saturating_add(self.savings)
    }

    pub fn has_negative_share(&self) -> bool {
        BudgetBucket::ALL
            .iter()
            .any(|bucket| self.percent_for(*bucket) < Decimal::ZERO)
    }

    /// True when the shares are non-negative and sum to exactly 100.
    pub fn is_complete(&self) -> bool {
        !self.has_negative_share() && self.total() == Decimal::ONE_HUNDRED
    }
}

impl Default for AllocationRule {
    fn default() -> Self {
        Self::new(50, 30, 20)
    }
}
