//! Account primitives.
//!
//! An `Account` is a place money lives: a bank account, a physical wallet or
//! loose cash. Its `balance_minor` is a materialized aggregate of every
//! active transaction referencing it, maintained incrementally by the
//! [`Ledger`] and never recomputed from scratch.
//!
//! [`Ledger`]: crate::Ledger

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Bank,
    Wallet,
    Cash,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::Wallet => "Wallet",
            Self::Cash => "Cash",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Bank" => Ok(Self::Bank),
            "Wallet" => Ok(Self::Wallet),
            "Cash" => Ok(Self::Cash),
            other => Err(LedgerError::Validation(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identifier, generated once and persisted.
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub account_number: Option<String>,
    pub kind: AccountKind,
    /// Signed balance in minor units. May go negative.
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        user_id: Uuid,
        name: String,
        account_number: Option<String>,
        kind: AccountKind,
        balance_minor: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            account_number,
            kind,
            balance_minor,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub account_number: Option<String>,
    pub kind: String,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            user_id: ActiveValue::Set(account.user_id.to_string()),
            name: ActiveValue::Set(account.name.clone()),
            account_number: ActiveValue::Set(account.account_number.clone()),
            kind: ActiveValue::Set(account.kind.as_str().to_string()),
            balance_minor: ActiveValue::Set(account.balance_minor),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = LedgerError;

    fn try_from(model: Model) -> ResultLedger<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("account".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| LedgerError::NotFound("account".to_string()))?,
            name: model.name,
            account_number: model.account_number,
            kind: AccountKind::try_from(model.kind.as_str())?,
            balance_minor: model.balance_minor,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [AccountKind::Bank, AccountKind::Wallet, AccountKind::Cash] {
            assert_eq!(AccountKind::try_from(kind.as_str()), Ok(kind));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(
            AccountKind::try_from("Crypto"),
            Err(LedgerError::Validation(_))
        ));
    }
}
