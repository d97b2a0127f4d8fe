//! Wire types shared between the server and its clients.
//!
//! Enum and field names follow the JSON the HTTP API speaks: transaction
//! and account kinds travel as a `type` field, paginated lists as
//! `{page, pageSize, total, totalPages, data}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page of a listing endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
    pub data: Vec<T>,
}

pub mod user {
    use super::*;

    /// Request body for `POST /auth/signup`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignUp {
        pub username: String,
        pub email: String,
        pub password: String,
    }

    /// Request body for `POST /auth/signin`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignIn {
        pub email: String,
        pub password: String,
    }

    /// Public view of a user, never carrying the password hash.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub username: String,
        pub email: String,
        pub profile_picture: Option<String>,
        pub provider: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub message: String,
        pub user: UserView,
    }

    /// Response body for `GET /auth/google`: where to send the browser.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoogleLoginResponse {
        pub url: String,
    }

    /// Query parameters Google appends to the callback redirect.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoogleCallback {
        pub code: String,
        pub state: String,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AccountKind {
        Bank,
        Wallet,
        Cash,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        #[serde(rename = "accountNumber")]
        pub account_number: Option<String>,
        #[serde(rename = "type")]
        pub kind: AccountKind,
        /// Opening balance in minor units. Defaults to zero.
        pub balance_minor: Option<i64>,
    }

    /// Allow-listed fields for `PUT /api/accounts/{id}`. The balance is
    /// not patchable; it only moves through transactions. Unknown fields
    /// are rejected rather than silently dropped.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct AccountUpdate {
        pub name: Option<String>,
        #[serde(rename = "accountNumber")]
        pub account_number: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<AccountKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        #[serde(rename = "accountNumber")]
        pub account_number: Option<String>,
        #[serde(rename = "type")]
        pub kind: AccountKind,
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    /// Query string for `GET /api/accounts`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountListQuery {
        pub page: Option<u64>,
        #[serde(rename = "type")]
        pub kind: Option<AccountKind>,
        pub search: Option<String>,
        pub min_balance: Option<i64>,
        pub max_balance: Option<i64>,
    }

    pub type AccountPage = super::PageResponse<AccountView>;
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
        Transfer,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        /// RFC3339 timestamp of when the transaction occurred.
        pub date: DateTime<Utc>,
        pub description: Option<String>,
        /// Amount in minor units; always a positive magnitude, the kind
        /// decides the direction.
        pub amount_minor: i64,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub category: String,
        pub account_id: Uuid,
        /// Destination account, required for transfers only.
        pub to_account_id: Option<Uuid>,
        pub status: Option<String>,
    }

    /// Partial update for `PUT /api/transactions/{id}`.
    ///
    /// `to_account_id` distinguishes "absent" from "null": omit the field
    /// to keep the stored destination, send `null` to clear it.
    #[serde_with::skip_serializing_none]
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct TransactionUpdate {
        pub date: Option<DateTime<Utc>>,
        pub description: Option<String>,
        pub amount_minor: Option<i64>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub category: Option<String>,
        pub account_id: Option<Uuid>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "serde_with::rust::double_option"
        )]
        pub to_account_id: Option<Option<Uuid>>,
        pub status: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub date: DateTime<Utc>,
        pub description: Option<String>,
        pub amount_minor: i64,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub category: String,
        pub account_id: Uuid,
        pub to_account_id: Option<Uuid>,
        pub status: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Query string for `GET /api/transactions`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub page: Option<u64>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub category: Option<String>,
        pub account_id: Option<Uuid>,
        pub status: Option<String>,
        pub min_amount: Option<i64>,
        pub max_amount: Option<i64>,
        pub start_date: Option<DateTime<Utc>>,
        pub end_date: Option<DateTime<Utc>>,
        pub search: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionDeleted {
        pub id: Uuid,
    }

    pub type TransactionPage = super::PageResponse<TransactionView>;
}
