//! Transactions API endpoints

use api_types::transaction::{
    TransactionDeleted, TransactionKind as ApiKind, TransactionListQuery, TransactionNew,
    TransactionPage, TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, accounts::user_id, server::ServerState};
use ledger::users;

fn map_kind(kind: ledger::TransactionKind) -> ApiKind {
    match kind {
        ledger::TransactionKind::Income => ApiKind::Income,
        ledger::TransactionKind::Expense => ApiKind::Expense,
        ledger::TransactionKind::Transfer => ApiKind::Transfer,
    }
}

fn unmap_kind(kind: ApiKind) -> ledger::TransactionKind {
    match kind {
        ApiKind::Income => ledger::TransactionKind::Income,
        ApiKind::Expense => ledger::TransactionKind::Expense,
        ApiKind::Transfer => ledger::TransactionKind::Transfer,
    }
}

fn view(tx: ledger::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        date: tx.date,
        description: tx.description,
        amount_minor: tx.amount_minor,
        kind: map_kind(tx.kind),
        category: tx.category,
        account_id: tx.account_id,
        to_account_id: tx.to_account_id,
        status: tx.status,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let cmd = ledger::NewTransactionCmd {
        date: payload.date,
        description: payload.description,
        amount_minor: payload.amount_minor,
        kind: unmap_kind(payload.kind),
        category: payload.category,
        account_id: payload.account_id,
        to_account_id: payload.to_account_id,
        status: payload.status,
    };

    let tx = state
        .ledger
        .create_transaction(cmd, user_id(&user)?)
        .await?;
    Ok((StatusCode::CREATED, Json(view(tx))))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.ledger.transaction(id, user_id(&user)?).await?;
    Ok(Json(view(tx)))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionPage>, ServerError> {
    let filter = ledger::TransactionListFilter {
        kind: query.kind.map(unmap_kind),
        category: query.category,
        account_id: query.account_id,
        status: query.status,
        min_amount: query.min_amount,
        max_amount: query.max_amount,
        start_date: query.start_date,
        end_date: query.end_date,
        search_term: query.search,
    };

    let page = state
        .ledger
        .list_transactions(user_id(&user)?, &filter, query.page.unwrap_or(1))
        .await?;

    Ok(Json(TransactionPage {
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
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let patch = ledger::TransactionPatch {
        date: payload.date,
        description: payload.description,
        amount_minor: payload.amount_minor,
        kind: payload.kind.map(unmap_kind),
        category: payload.category,
        account_id: payload.account_id,
        to_account_id: payload.to_account_id,
        status: payload.status,
    };

    let tx = state
        .ledger
        .update_transaction(id, patch, user_id(&user)?)
        .await?;
    Ok(Json(view(tx)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionDeleted>, ServerError> {
    let id = state
        .ledger
        .delete_transaction(id, user_id(&user)?)
        .await?;
    Ok(Json(TransactionDeleted { id }))
}
