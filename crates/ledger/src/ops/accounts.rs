use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, AccountListFilter, AccountPatch, LedgerError, NewAccountCmd, PAGE_SIZE, ResultLedger,
    accounts, transactions,
};

use super::{Ledger, Page, normalize_required_name, with_tx};

impl Ledger {
    /// Creates an account with an optional opening balance.
    ///
    /// The opening balance is the only direct balance write; afterwards the
    /// balance changes exclusively through transaction operations.
    pub async fn create_account(&self, cmd: NewAccountCmd) -> ResultLedger<Account> {
        let name = normalize_required_name(&cmd.name, "account")?;
        with_tx!(self, |db_tx| {
            self.require_unique_account_name(&db_tx, cmd.user_id, &name, None)
                .await?;

            let account = Account::new(
                cmd.user_id,
                name,
                cmd.account_number,
                cmd.kind,
                cmd.balance_minor,
            );
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })
    }

    /// Returns one account owned by `user_id`.
    pub async fn account(&self, account_id: Uuid, user_id: Uuid) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_owned_account(&db_tx, account_id, user_id).await?;
            Account::try_from(model)
        })
    }

    /// Lists the user's accounts, filtered and paginated (newest page shape
    /// mirrors the HTTP response: page/total/total_pages/data).
    pub async fn list_accounts(
        &self,
        user_id: Uuid,
        filter: &AccountListFilter,
        page: u64,
    ) -> ResultLedger<Page<Account>> {
        let page = page.max(1);
        with_tx!(self, |db_tx| {
            let mut query = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(accounts::Column::CreatedAt);

            if let Some(kind) = filter.kind {
                query = query.filter(accounts::Column::Kind.eq(kind.as_str()));
            }
            if let Some(search_term) = &filter.search_term {
                query = query.filter(accounts::Column::Name.contains(search_term));
            }
            if let Some(min_balance) = filter.min_balance {
                query = query.filter(accounts::Column::BalanceMinor.gte(min_balance));
            }
            if let Some(max_balance) = filter.max_balance {
                query = query.filter(accounts::Column::BalanceMinor.lte(max_balance));
            }

            let paginator = query.paginate(&db_tx, PAGE_SIZE);
            let total = paginator.num_items().await?;
            let models = paginator.fetch_page(page - 1).await?;

            let mut data = Vec::with_capacity(models.len());
            for model in models {
                data.push(Account::try_from(model)?);
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

    /// Amends an account's name, number or kind.
    ///
    /// The balance is not an updatable field: it belongs to the transaction
    /// operations alone.
    pub async fn update_account(
        &self,
        account_id: Uuid,
        patch: AccountPatch,
        user_id: Uuid,
    ) -> ResultLedger<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_owned_account(&db_tx, account_id, user_id).await?;

            let name = match &patch.name {
                Some(name) => {
                    let name = normalize_required_name(name, "account")?;
                    if !name.eq_ignore_ascii_case(&model.name) {
                        self.require_unique_account_name(&db_tx, user_id, &name, Some(account_id))
                            .await?;
                    }
                    name
                }
                None => model.name.clone(),
            };

            let active = accounts::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                name: ActiveValue::Set(name),
                account_number: ActiveValue::Set(
                    patch.account_number.or_else(|| model.account_number.clone()),
                ),
                kind: ActiveValue::Set(
                    patch
                        .kind
                        .map(|kind| kind.as_str().to_string())
                        .unwrap_or_else(|| model.kind.clone()),
                ),
                ..Default::default()
            };
            let updated = active.update(&db_tx).await?;
            Account::try_from(updated)
        })
    }

    /// Deletes an account that no transaction references.
    ///
    /// Deletion is blocked while any transaction still names the account as
    /// source or destination, otherwise the balance invariant would lose its
    /// history.
    pub async fn delete_account(&self, account_id: Uuid, user_id: Uuid) -> ResultLedger<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_owned_account(&db_tx, account_id, user_id).await?;

            let referencing = transactions::Entity::find()
                .filter(
                    Condition::any()
                        .add(transactions::Column::AccountId.eq(account_id.to_string()))
                        .add(transactions::Column::ToAccountId.eq(account_id.to_string())),
                )
                .count(&db_tx)
                .await?;
            if referencing > 0 {
                return Err(LedgerError::Conflict(format!(
                    "account is referenced by {referencing} transaction(s)"
                )));
            }

            accounts::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Loads an account by id for CRUD purposes, reporting a missing or
    /// foreign account as not found.
    async fn require_owned_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        user_id: Uuid,
    ) -> ResultLedger<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::NotFound("account".to_string()))
    }

    async fn require_unique_account_name(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultLedger<()> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(exclude) = exclude {
            query = query.filter(accounts::Column::Id.ne(exclude.to_string()));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(LedgerError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
