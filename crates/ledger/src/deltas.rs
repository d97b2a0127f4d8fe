//! Balance delta calculation.
//!
//! Maps a transaction and a direction to the signed per-account balance
//! adjustments it implies. The apply/reverse duality is a single +1/−1
//! multiplier, so create, update and delete all share one code path.

use uuid::Uuid;

use crate::{Transaction, TransactionKind};

/// Whether a transaction's effect is being enacted or undone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Apply,
    Reverse,
}

impl Direction {
    pub fn sign(self) -> i64 {
        match self {
            Self::Apply => 1,
            Self::Reverse => -1,
        }
    }
}

/// Computes the `(account_id, signed_amount_minor)` adjustments implied by
/// `tx` in the given direction.
///
/// - income: `+amount` on the source account
/// - expense: `−amount` on the source account
/// - transfer: `−amount` on the source, `+amount` on the destination
///
/// Under [`Direction::Reverse`] every sign flips. Pure and infallible: a
/// transfer without a destination (rejected by validation before it can be
/// stored) yields only the source adjustment.
pub fn balance_deltas(tx: &Transaction, direction: Direction) -> Vec<(Uuid, i64)> {
    let sign = direction.sign();
    match tx.kind {
        TransactionKind::Income => vec![(tx.account_id, sign * tx.amount_minor)],
        TransactionKind::Expense => vec![(tx.account_id, -sign * tx.amount_minor)],
        TransactionKind::Transfer => {
            let mut deltas = vec![(tx.account_id, -sign * tx.amount_minor)];
            if let Some(to_account_id) = tx.to_account_id {
                deltas.push((to_account_id, sign * tx.amount_minor));
            }
            deltas
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn transaction(kind: TransactionKind, to_account_id: Option<Uuid>) -> Transaction {
        Transaction::new(
            Utc::now(),
            None,
            1000,
            kind,
            "groceries".to_string(),
            Uuid::new_v4(),
            to_account_id,
            None,
        )
        .unwrap()
    }

    #[test]
    fn income_applies_positive_and_reverses_negative() {
        let tx = transaction(TransactionKind::Income, None);
        assert_eq!(
            balance_deltas(&tx, Direction::Apply),
            vec![(tx.account_id, 1000)]
        );
        assert_eq!(
            balance_deltas(&tx, Direction::Reverse),
            vec![(tx.account_id, -1000)]
        );
    }

    #[test]
    fn expense_applies_negative_and_reverses_positive() {
        let tx = transaction(TransactionKind::Expense, None);
        assert_eq!(
            balance_deltas(&tx, Direction::Apply),
            vec![(tx.account_id, -1000)]
        );
        assert_eq!(
            balance_deltas(&tx, Direction::Reverse),
            vec![(tx.account_id, 1000)]
        );
    }

    #[test]
    fn transfer_debits_source_and_credits_destination() {
        let to = Uuid::new_v4();
        let tx = transaction(TransactionKind::Transfer, Some(to));
        assert_eq!(
            balance_deltas(&tx, Direction::Apply),
            vec![(tx.account_id, -1000), (to, 1000)]
        );
        assert_eq!(
            balance_deltas(&tx, Direction::Reverse),
            vec![(tx.account_id, 1000), (to, -1000)]
        );
    }

    #[test]
    fn reverse_then_apply_cancels() {
        let to = Uuid::new_v4();
        for tx in [
            transaction(TransactionKind::Income, None),
            transaction(TransactionKind::Expense, None),
            transaction(TransactionKind::Transfer, Some(to)),
        ] {
            let mut sums = std::collections::HashMap::new();
            for (account, amount) in balance_deltas(&tx, Direction::Apply)
                .into_iter()
                .chain(balance_deltas(&tx, Direction::Reverse))
            {
                *sums.entry(account).or_insert(0i64) += amount;
            }
            assert!(sums.values().all(|sum| *sum == 0));
        }
    }

    #[test]
    fn malformed_transfer_has_no_destination_effect() {
        let tx = transaction(TransactionKind::Transfer, None);
        assert_eq!(
            balance_deltas(&tx, Direction::Apply),
            vec![(tx.account_id, -1000)]
        );
    }
}
