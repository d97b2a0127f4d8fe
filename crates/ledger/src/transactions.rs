//! Transaction primitives.
//!
//! A `Transaction` records one monetary event against one account (income,
//! expense) or a pair of accounts (transfer). The stored `amount_minor` is a
//! positive magnitude; the sign of its effect on each balance is derived
//! from the kind by [`balance_deltas`].
//!
//! [`balance_deltas`]: crate::balance_deltas

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

pub const DEFAULT_STATUS: &str = "cleared";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(LedgerError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    /// Positive magnitude in minor units; the sign comes from `kind`.
    pub amount_minor: i64,
    pub kind: TransactionKind,
    /// Opaque category reference.
    pub category: String,
    /// Source account.
    pub account_id: Uuid,
    /// Destination account; present iff `kind == Transfer`.
    pub to_account_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: DateTime<Utc>,
        description: Option<String>,
        amount_minor: i64,
        kind: TransactionKind,
        category: String,
        account_id: Uuid,
        to_account_id: Option<Uuid>,
        status: Option<String>,
    ) -> ResultLedger<Self> {
        if amount_minor <= 0 {
            return Err(LedgerError::Validation(
                "amount_minor must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            date,
            description,
            amount_minor,
            kind,
            category,
            account_id,
            to_account_id,
            status: status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub date: DateTimeUtc,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub kind: String,
    pub category: String,
    pub account_id: String,
    pub to_account_id: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            date: ActiveValue::Set(tx.date),
            description: ActiveValue::Set(tx.description.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            category: ActiveValue::Set(tx.category.clone()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            to_account_id: ActiveValue::Set(tx.to_account_id.map(|id| id.to_string())),
            status: ActiveValue::Set(tx.status.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> ResultLedger<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("transaction".to_string()))?,
            date: model.date,
            description: model.description,
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            category: model.category,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| LedgerError::NotFound("transaction".to_string()))?,
            to_account_id: model
                .to_account_id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(|_| LedgerError::NotFound("transaction".to_string()))?,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
