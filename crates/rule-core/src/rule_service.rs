use rust_decimal::Decimal;
use tracing::{info, warn};

use rule_domain::AllocationRule;

use crate::{store::RuleStore, CoreError};

/// Outcome of asking for a new allocation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleUpdate {
    /// The rule was complete and has been written to the rule store.
    Persisted(AllocationRule),
    /// The rule was incomplete; the store still holds the last valid rule.
    Rejected { rule: AllocationRule, total: Decimal },
}

pub struct RuleService;

impl RuleService {
    pub fn load(store: &dyn RuleStore) -> Result<AllocationRule, CoreError> {
        store.get_rule()
    }

    /// Persists `rule` only when its shares are non-negative and sum to 100.
    pub fn apply(store: &dyn RuleStore, rule: AllocationRule) -> Result<RuleUpdate, CoreError> {
        if !rule.is_complete() {
            warn!(total = %rule.total(), "rule not persisted: shares must sum to 100");
            return Ok(RuleUpdate::Rejected {
                rule,
                total: rule.total(),
            });
        }
        store.update_rule(&rule)?;
        info!(
            needs = %rule.needs,
            wants = %rule.wants,
            savings = %rule.savings,
            "allocation rule persisted"
        );
        Ok(RuleUpdate::Persisted(rule))
    }
}
