use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Direction, LedgerError, NewTransactionCmd, PAGE_SIZE, ResultLedger, Transaction,
    TransactionListFilter, TransactionPatch, accounts, transactions,
};

use super::{Ledger, Page, validate_transaction_shape, with_tx};

impl Ledger {
    /// Creates a transaction and applies its balance effect.
    ///
    /// Reference checks, the record insert and every balance increment share
    /// one database transaction: a rejection at any step leaves no trace.
    pub async fn create_transaction(
        &self,
        cmd: NewTransactionCmd,
        user_id: Uuid,
    ) -> ResultLedger<Transaction> {
        let tx = Transaction::new(
            cmd.date,
            cmd.description,
            cmd.amount_minor,
            cmd.kind,
            cmd.category,
            cmd.account_id,
            cmd.to_account_id,
            cmd.status,
        )?;
        validate_transaction_shape(&tx)?;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, tx.account_id).await?;
            if let Some(to_account_id) = tx.to_account_id {
                self.require_account(&db_tx, user_id, to_account_id).await?;
            }

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            self.apply_deltas(&db_tx, &tx, Direction::Apply).await?;
            Ok(tx)
        })
    }

    /// Returns one transaction visible to `user_id`.
    pub async fn transaction(&self, transaction_id: Uuid, user_id: Uuid) -> ResultLedger<Transaction> {
        with_tx!(self, |db_tx| {
            self.require_visible_transaction(&db_tx, transaction_id, user_id)
                .await
        })
    }

    /// Amends a transaction and keeps every affected balance consistent.
    ///
    /// The stored effect is reversed, the record is rewritten, and the new
    /// effect is applied, all in one database transaction. A patch that
    /// changes nothing therefore leaves every balance exactly as it was.
    pub async fn update_transaction(
        &self,
        transaction_id: Uuid,
        patch: TransactionPatch,
        user_id: Uuid,
    ) -> ResultLedger<Transaction> {
        with_tx!(self, |db_tx| {
            let old = self
                .require_visible_transaction(&db_tx, transaction_id, user_id)
                .await?;

            let new = merge_patch(&old, patch);
            validate_transaction_shape(&new)?;
            if new.account_id != old.account_id {
                self.require_account(&db_tx, user_id, new.account_id).await?;
            }
            if let Some(to_account_id) = new.to_account_id
                && old.to_account_id != Some(to_account_id)
            {
                self.require_account(&db_tx, user_id, to_account_id).await?;
            }

            self.apply_deltas(&db_tx, &old, Direction::Reverse).await?;
            transactions::ActiveModel::from(&new).update(&db_tx).await?;
            self.apply_deltas(&db_tx, &new, Direction::Apply).await?;
            Ok(new)
        })
    }

    /// Deletes a transaction and undoes its balance effect.
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> ResultLedger<Uuid> {
        with_tx!(self, |db_tx| {
            let old = self
                .require_visible_transaction(&db_tx, transaction_id, user_id)
                .await?;

            transactions::Entity::delete_by_id(old.id.to_string())
                .exec(&db_tx)
                .await?;
            self.apply_deltas(&db_tx, &old, Direction::Reverse).await?;
            Ok(old.id)
        })
    }

    /// Lists the user's transactions, filtered and paginated, newest first.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: &TransactionListFilter,
        page: u64,
    ) -> ResultLedger<Page<Transaction>> {
        let page = page.max(1);
        with_tx!(self, |db_tx| {
            let account_ids: Vec<String> = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|account| account.id)
                .collect();

            let mut query = transactions::Entity::find()
                .filter(transactions::Column::AccountId.is_in(account_ids))
                .order_by_desc(transactions::Column::Date);

            if let Some(kind) = filter.kind {
                query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
            }
            if let Some(category) = &filter.category {
                query = query.filter(transactions::Column::Category.eq(category.clone()));
            }
            if let Some(account_id) = filter.account_id {
                query = query.filter(transactions::Column::AccountId.eq(account_id.to_string()));
            }
            if let Some(status) = &filter.status {
                query = query.filter(transactions::Column::Status.eq(status.clone()));
            }
            if let Some(min_amount) = filter.min_amount {
                query = query.filter(transactions::Column::AmountMinor.gte(min_amount));
            }
            if let Some(max_amount) = filter.max_amount {
                query = query.filter(transactions::Column::AmountMinor.lte(max_amount));
            }
            if let Some(start_date) = filter.start_date {
                query = query.filter(transactions::Column::Date.gte(start_date));
            }
            if let Some(end_date) = filter.end_date {
                query = query.filter(transactions::Column::Date.lte(end_date));
            }
            if let Some(search_term) = &filter.search_term {
                query = query.filter(transactions::Column::Description.contains(search_term));
            }

            let paginator = query.paginate(&db_tx, PAGE_SIZE);
            let total = paginator.num_items().await?;
            let models = paginator.fetch_page(page - 1).await?;

            let mut data = Vec::with_capacity(models.len());
            for model in models {
                data.push(Transaction::try_from(model)?);
            }
            Ok(Page {
                page,
                page_size: PAGE_SIZE,
                total,
                total_pages: total.div_ceil(PAGE_SIZE),
                data,
            })
        })
    }

    /// Loads a transaction and checks it belongs to one of the user's
    /// accounts. A foreign transaction is reported as not found rather than
    /// leaking its existence.
    async fn require_visible_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> ResultLedger<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::NotFound("transaction".to_string()))?;
        let tx = Transaction::try_from(model)?;
        self.require_account(db_tx, user_id, tx.account_id)
            .await
            .map_err(|err| match err {
                LedgerError::InvalidReference(_) => {
                    LedgerError::NotFound("transaction".to_string())
                }
                other => other,
            })?;
        Ok(tx)
    }
}

fn merge_patch(old: &Transaction, patch: TransactionPatch) -> Transaction {
    Transaction {
        id: old.id,
        date: patch.date.unwrap_or(old.date),
        description: patch.description.or_else(|| old.description.clone()),
        amount_minor: patch.amount_minor.unwrap_or(old.amount_minor),
        kind: patch.kind.unwrap_or(old.kind),
        category: patch.category.unwrap_or_else(|| old.category.clone()),
        account_id: patch.account_id.unwrap_or(old.account_id),
        to_account_id: match patch.to_account_id {
            Some(to_account_id) => to_account_id,
            None => old.to_account_id,
        },
        status: patch.status.unwrap_or_else(|| old.status.clone()),
        created_at: old.created_at,
        updated_at: Utc::now(),
    }
}
