//! Command and filter inputs for [`Ledger`] operations.
//!
//! [`Ledger`]: crate::Ledger

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AccountKind, TransactionKind};

#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub user_id: Uuid,
    pub name: String,
    pub account_number: Option<String>,
    pub kind: AccountKind,
    /// Opening balance in minor units. After creation the balance is only
    /// ever mutated through transaction operations.
    pub balance_minor: i64,
}

/// Allow-listed account fields a client may amend. The balance is
/// deliberately absent.
#[derive(Clone, Debug, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub account_number: Option<String>,
    pub kind: Option<AccountKind>,
}

#[derive(Clone, Debug, Default)]
pub struct AccountListFilter {
    pub kind: Option<AccountKind>,
    /// Substring match on the account name.
    pub search_term: Option<String>,
    pub min_balance: Option<i64>,
    pub max_balance: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub account_id: Uuid,
    pub to_account_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Partial field changes for an existing transaction.
///
/// `to_account_id` is doubly optional: the outer `None` keeps the stored
/// value, `Some(None)` removes the destination (required when changing a
/// transfer into an income or expense).
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub amount_minor: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub account_id: Option<Uuid>,
    pub to_account_id: Option<Option<Uuid>>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub account_id: Option<Uuid>,
    pub status: Option<String>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    /// Inclusive lower bound on the transaction date.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the transaction date.
    pub end_date: Option<DateTime<Utc>>,
    /// Substring match on the description.
    pub search_term: Option<String>,
}
