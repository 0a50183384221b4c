//! Running balance and the write-time overspend guard.

use rust_decimal::Decimal;
use serde::Serialize;

use rule_domain::{Transaction, TransactionKind};

/// Whether an expense is being added or an existing one edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseIntent {
    New,
    Edit,
}

/// Advisory verdict for a prospective transaction.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum BalanceCheck {
    Allowed,
    Rejected { balance: Decimal, requested: Decimal },
}

impl BalanceCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, BalanceCheck::Allowed)
    }

    /// How far the requested expense exceeds the balance; zero when allowed.
    pub fn shortfall(&self) -> Decimal {
        match self {
            BalanceCheck::Allowed => Decimal::ZERO,
            BalanceCheck::Rejected { balance, requested } => requested.saturating_sub(*balance),
        }
    }
}

pub struct BalanceService;

impl BalanceService {
    /// Income minus expenses over the given transactions.
    pub fn current_balance<'a, I>(transactions: I) -> Decimal
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        transactions
            .into_iter()
            .fold(Decimal::ZERO, |balance, txn| balance.saturating_add(txn.signed_amount()))
    }

    /// Strictly `proposed > current_balance`; spending the exact balance is allowed.
    pub fn would_exceed_balance(current_balance: Decimal, proposed_expense: Decimal) -> bool {
        proposed_expense > current_balance
    }

    /// Only new expenses are guarded; income and edits always pass.
    pub fn check(
        current_balance: Decimal,
        amount: Decimal,
        kind: TransactionKind,
        intent: ExpenseIntent,
    ) -> BalanceCheck {
        let guarded = kind == TransactionKind::Expense && intent == ExpenseIntent::New;
        if guarded && Self::would_exceed_balance(current_balance, amount) {
            BalanceCheck::Rejected {
                balance: current_balance,
                requested: amount,
            }
        } else {
            BalanceCheck::Allowed
        }
    }

    /// Balance left after a prospective expense, for live previews. `None` for income.
    pub fn live_remaining(
        current_balance: Decimal,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Option<Decimal> {
        match kind {
            TransactionKind::Expense => Some(current_balance.saturating_sub(amount)),
            TransactionKind::Income => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rule_domain::BudgetBucket;
    use rust_decimal_macros::dec;

    #[test]
    fn guard_is_strict() {
        assert!(BalanceService::would_exceed_balance(dec!(500), dec!(500.01)));
        assert!(!BalanceService::would_exceed_balance(dec!(500), dec!(500.00)));
    }

    #[test]
    fn balance_is_income_minus_expense() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let txns = vec![
            Transaction::income("Salary", dec!(1000), day),
            Transaction::expense("Rent", dec!(700), day, Some(BudgetBucket::Needs)),
            Transaction::expense("Coffee", dec!(450), day, None),
        ];
        assert_eq!(BalanceService::current_balance(&txns), dec!(-150));
    }

    #[test]
    fn only_new_expenses_are_rejected() {
        let balance = dec!(100);
        let rejected = BalanceService::check(
            balance,
            dec!(150),
            TransactionKind::Expense,
            ExpenseIntent::New,
        );
        assert_eq!(
            rejected,
            BalanceCheck::Rejected {
                balance,
                requested: dec!(150)
            }
        );
        assert_eq!(rejected.shortfall(), dec!(50));

        assert!(BalanceService::check(
            balance,
            dec!(150),
            TransactionKind::Expense,
            ExpenseIntent::Edit
        )
        .is_allowed());
        assert!(BalanceService::check(
            balance,
            dec!(150),
            TransactionKind::Income,
            ExpenseIntent::New
        )
        .is_allowed());
    }

    #[test]
    fn live_remaining_previews_expenses_only() {
        assert_eq!(
            BalanceService::live_remaining(dec!(80), dec!(100), TransactionKind::Expense),
            Some(dec!(-20))
        );
        assert_eq!(
            BalanceService::live_remaining(dec!(80), dec!(100), TransactionKind::Income),
            None
        );
    }
}
