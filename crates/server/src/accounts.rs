//! Accounts API endpoints

use api_types::account::{
    AccountKind as ApiKind, AccountListQuery, AccountNew, AccountPage, AccountUpdate, AccountView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use ledger::users;

fn map_kind(kind: ledger::AccountKind) -> ApiKind {
    match kind {
        ledger::AccountKind::Bank => ApiKind::Bank,
        ledger::AccountKind::Wallet => ApiKind::Wallet,
        ledger::AccountKind::Cash => ApiKind::Cash,
    }
}

fn unmap_kind(kind: ApiKind) -> ledger::AccountKind {
    match kind {
        ApiKind::Bank => ledger::AccountKind::Bank,
        ApiKind::Wallet => ledger::AccountKind::Wallet,
        ApiKind::Cash => ledger::AccountKind::Cash,
    }
}

fn view(account: ledger::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        account_number: account.account_number,
        kind: map_kind(account.kind),
        balance_minor: account.balance_minor,
        created_at: account.created_at,
    }
}

pub(crate) fn user_id(user: &users::Model) -> Result<Uuid, ServerError> {
    Uuid::parse_str(&user.id)
        .map_err(|err| ServerError::Internal(format!("malformed user id: {err}")))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let cmd = ledger::NewAccountCmd {
        user_id: user_id(&user)?,
        name: payload.name,
        account_number: payload.account_number,
        kind: unmap_kind(payload.kind),
        balance_minor: payload.balance_minor.unwrap_or(0),
    };

    let account = state.ledger.create_account(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(account))))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.ledger.account(id, user_id(&user)?).await?;
    Ok(Json(view(account)))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<AccountListQuery>,
) -> Result<Json<AccountPage>, ServerError> {
    let filter = ledger::AccountListFilter {
        kind: query.kind.map(unmap_kind),
        search_term: query.search,
        min_balance: query.min_balance,
        max_balance: query.max_balance,
    };

    let page = state
        .ledger
        .list_accounts(user_id(&user)?, &filter, query.page.unwrap_or(1))
        .await?;

    Ok(Json(AccountPage {
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
        data: page.data.into_iter().map(view).collect(),
    }))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let patch = ledger::AccountPatch {
        name: payload.name,
        account_number: payload.account_number,
        kind: payload.kind.map(unmap_kind),
    };

    let account = state
        .ledger
        .update_account(id, patch, user_id(&user)?)
        .await?;
    Ok(Json(view(account)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.ledger.delete_account(id, user_id(&user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
