use sea_orm::{DatabaseConnection, DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use serde::Serialize;
use uuid::Uuid;

use crate::{Direction, LedgerError, ResultLedger, Transaction, balance_deltas};

mod accounts;
mod transactions;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// One page of a list result, shaped like the HTTP response.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
    pub data: Vec<T>,
}

/// The ledger coordinator.
///
/// The only component permitted to mutate a transaction record together
/// with the balances of the accounts it references. Holds no state beyond
/// the connection; every operation is self-contained.
#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// Loads an account and verifies it belongs to `user_id`.
    ///
    /// A foreign account is reported the same as a missing one.
    pub(crate) async fn require_account(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        account_id: Uuid,
    ) -> ResultLedger<crate::accounts::Model> {
        crate::accounts::Entity::find_by_id(account_id.to_string())
            .filter(crate::accounts::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::InvalidReference(account_id.to_string()))
    }

    /// Atomically adds `delta_minor` to an account balance.
    ///
    /// The increment happens in SQL (`balance = balance + ?`) so concurrent
    /// adjustments to the same account can never lose an update.
    pub(crate) async fn increment_balance(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        delta_minor: i64,
    ) -> ResultLedger<()> {
        let result = crate::accounts::Entity::update_many()
            .col_expr(
                crate::accounts::Column::BalanceMinor,
                Expr::col(crate::accounts::Column::BalanceMinor).add(delta_minor),
            )
            .filter(crate::accounts::Column::Id.eq(account_id.to_string()))
            .exec(db_tx)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::InvalidReference(account_id.to_string()));
        }
        Ok(())
    }

    /// Applies every balance delta of `tx` in the given direction.
    pub(crate) async fn apply_deltas(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
        direction: Direction,
    ) -> ResultLedger<()> {
        for (account_id, delta_minor) in balance_deltas(tx, direction) {
            self.increment_balance(db_tx, account_id, delta_minor).await?;
        }
        Ok(())
    }
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultLedger<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validates the shape invariants shared by create and update:
/// positive amount, a non-empty category, and a destination account
/// present iff the kind is a transfer.
pub(crate) fn validate_transaction_shape(tx: &Transaction) -> ResultLedger<()> {
    if tx.amount_minor <= 0 {
        return Err(LedgerError::Validation(
            "amount_minor must be > 0".to_string(),
        ));
    }
    if tx.category.trim().is_empty() {
        return Err(LedgerError::Validation(
            "category must not be empty".to_string(),
        ));
    }
    match (tx.kind, tx.to_account_id) {
        (crate::TransactionKind::Transfer, None) => Err(LedgerError::MissingDestination(
            "transfer requires a destination account".to_string(),
        )),
        (crate::TransactionKind::Transfer, Some(to_account_id)) => {
            if to_account_id == tx.account_id {
                return Err(LedgerError::Validation(
                    "account_id and to_account_id must differ".to_string(),
                ));
            }
            Ok(())
        }
        (_, Some(_)) => Err(LedgerError::MissingDestination(
            "destination account is only valid for transfers".to_string(),
        )),
        (_, None) => Ok(()),
    }
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
        }
    }
}
