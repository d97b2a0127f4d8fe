use chrono::Utc;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use ledger::{
    AccountKind, Ledger, LedgerError, NewAccountCmd, NewTransactionCmd, TransactionKind,
    TransactionListFilter, TransactionPatch,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> (Ledger, DatabaseConnection, Uuid) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let user_id = insert_user(&db, "alice", "alice@example.com").await;
    let ledger = Ledger::builder().database(db.clone()).build();
    (ledger, db, user_id)
}

async fn insert_user(db: &DatabaseConnection, username: &str, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    ledger::users::ActiveModel {
        id: Set(id.to_string()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(None),
        profile_picture: Set(None),
        provider: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

async fn new_account(ledger: &Ledger, user_id: Uuid, name: &str, balance_minor: i64) -> Uuid {
    ledger
        .create_account(NewAccountCmd {
            user_id,
            name: name.to_string(),
            account_number: None,
            kind: AccountKind::Bank,
            balance_minor,
        })
        .await
        .unwrap()
        .id
}

async fn balance_of(ledger: &Ledger, account_id: Uuid, user_id: Uuid) -> i64 {
    ledger
        .account(account_id, user_id)
        .await
        .unwrap()
        .balance_minor
}

fn income(account_id: Uuid, amount_minor: i64) -> NewTransactionCmd {
    NewTransactionCmd {
        date: Utc::now(),
        description: None,
        amount_minor,
        kind: TransactionKind::Income,
        category: "salary".to_string(),
        account_id,
        to_account_id: None,
        status: None,
    }
}

fn expense(account_id: Uuid, amount_minor: i64) -> NewTransactionCmd {
    NewTransactionCmd {
        kind: TransactionKind::Expense,
        category: "groceries".to_string(),
        ..income(account_id, amount_minor)
    }
}

fn transfer(account_id: Uuid, to_account_id: Uuid, amount_minor: i64) -> NewTransactionCmd {
    NewTransactionCmd {
        kind: TransactionKind::Transfer,
        category: "transfer".to_string(),
        to_account_id: Some(to_account_id),
        ..income(account_id, amount_minor)
    }
}

#[tokio::test]
async fn income_increases_source_balance() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 0).await;

    ledger
        .create_transaction(income(account_id, 1000), user_id)
        .await
        .unwrap();

    assert_eq!(balance_of(&ledger, account_id, user_id).await, 1000);
}

#[tokio::test]
async fn expense_decreases_balance_and_may_go_negative() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 500).await;

    ledger
        .create_transaction(expense(account_id, 800), user_id)
        .await
        .unwrap();

    assert_eq!(balance_of(&ledger, account_id, user_id).await, -300);
}

#[tokio::test]
async fn transfer_moves_funds_between_accounts() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 1000).await;
    let dest = new_account(&ledger, user_id, "Savings", 0).await;

    ledger
        .create_transaction(transfer(source, dest, 400), user_id)
        .await
        .unwrap();

    assert_eq!(balance_of(&ledger, source, user_id).await, 600);
    assert_eq!(balance_of(&ledger, dest, user_id).await, 400);
}

#[tokio::test]
async fn delete_reverses_the_balance_effect() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 1000).await;
    let dest = new_account(&ledger, user_id, "Savings", 0).await;

    let tx = ledger
        .create_transaction(transfer(source, dest, 400), user_id)
        .await
        .unwrap();
    ledger.delete_transaction(tx.id, user_id).await.unwrap();

    assert_eq!(balance_of(&ledger, source, user_id).await, 1000);
    assert_eq!(balance_of(&ledger, dest, user_id).await, 0);
}

#[tokio::test]
async fn update_amount_adjusts_balance_by_the_difference() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 0).await;

    let tx = ledger
        .create_transaction(income(account_id, 1000), user_id)
        .await
        .unwrap();
    ledger
        .update_transaction(
            tx.id,
            TransactionPatch {
                amount_minor: Some(400),
                ..Default::default()
            },
            user_id,
        )
        .await
        .unwrap();

    assert_eq!(balance_of(&ledger, account_id, user_id).await, 400);
}

#[tokio::test]
async fn update_retargets_the_balance_to_the_new_account() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let first = new_account(&ledger, user_id, "Checking", 0).await;
    let second = new_account(&ledger, user_id, "Savings", 0).await;

    let tx = ledger
        .create_transaction(income(first, 1000), user_id)
        .await
        .unwrap();
    ledger
        .update_transaction(
            tx.id,
            TransactionPatch {
                account_id: Some(second),
                ..Default::default()
            },
            user_id,
        )
        .await
        .unwrap();

    assert_eq!(balance_of(&ledger, first, user_id).await, 0);
    assert_eq!(balance_of(&ledger, second, user_id).await, 1000);
}

#[tokio::test]
async fn update_kind_flips_the_balance_effect() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 0).await;

    let tx = ledger
        .create_transaction(income(account_id, 1000), user_id)
        .await
        .unwrap();
    ledger
        .update_transaction(
            tx.id,
            TransactionPatch {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
            user_id,
        )
        .await
        .unwrap();

    assert_eq!(balance_of(&ledger, account_id, user_id).await, -1000);
}

#[tokio::test]
async fn noop_update_leaves_balances_unchanged() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 1000).await;
    let dest = new_account(&ledger, user_id, "Savings", 0).await;

    let tx = ledger
        .create_transaction(transfer(source, dest, 400), user_id)
        .await
        .unwrap();
    ledger
        .update_transaction(tx.id, TransactionPatch::default(), user_id)
        .await
        .unwrap();

    assert_eq!(balance_of(&ledger, source, user_id).await, 600);
    assert_eq!(balance_of(&ledger, dest, user_id).await, 400);
}

#[tokio::test]
async fn transfer_to_unknown_destination_leaves_no_trace() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 1000).await;

    let err = ledger
        .create_transaction(transfer(source, Uuid::new_v4(), 400), user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidReference(_)));

    assert_eq!(balance_of(&ledger, source, user_id).await, 1000);
    let page = ledger
        .list_transactions(user_id, &TransactionListFilter::default(), 1)
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn transfer_requires_a_destination() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 0).await;

    let mut cmd = transfer(source, Uuid::new_v4(), 400);
    cmd.to_account_id = None;
    let err = ledger.create_transaction(cmd, user_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::MissingDestination(_)));
}

#[tokio::test]
async fn transfer_to_itself_is_rejected() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 0).await;

    let err = ledger
        .create_transaction(transfer(source, source, 400), user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn destination_on_a_non_transfer_is_rejected() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 0).await;
    let dest = new_account(&ledger, user_id, "Savings", 0).await;

    let mut cmd = expense(source, 400);
    cmd.to_account_id = Some(dest);
    let err = ledger.create_transaction(cmd, user_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::MissingDestination(_)));
}

#[tokio::test]
async fn non_positive_amount_is_rejected() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 0).await;

    let err = ledger
        .create_transaction(income(source, 0), user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn turning_a_transfer_into_an_expense_requires_clearing_the_destination() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let source = new_account(&ledger, user_id, "Checking", 1000).await;
    let dest = new_account(&ledger, user_id, "Savings", 0).await;

    let tx = ledger
        .create_transaction(transfer(source, dest, 400), user_id)
        .await
        .unwrap();

    // Keeping the stored destination makes the new shape invalid.
    let err = ledger
        .update_transaction(
            tx.id,
            TransactionPatch {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
            user_id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingDestination(_)));

    ledger
        .update_transaction(
            tx.id,
            TransactionPatch {
                kind: Some(TransactionKind::Expense),
                to_account_id: Some(None),
                ..Default::default()
            },
            user_id,
        )
        .await
        .unwrap();

    assert_eq!(balance_of(&ledger, source, user_id).await, 600);
    assert_eq!(balance_of(&ledger, dest, user_id).await, 0);
}

#[tokio::test]
async fn foreign_transactions_are_reported_as_not_found() {
    let (ledger, db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 0).await;
    let tx = ledger
        .create_transaction(income(account_id, 1000), user_id)
        .await
        .unwrap();

    let other_user = insert_user(&db, "bob", "bob@example.com").await;
    let err = ledger.transaction(tx.id, other_user).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn referenced_account_cannot_be_deleted() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 0).await;
    let tx = ledger
        .create_transaction(income(account_id, 1000), user_id)
        .await
        .unwrap();

    let err = ledger.delete_account(account_id, user_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));

    ledger.delete_transaction(tx.id, user_id).await.unwrap();
    ledger.delete_account(account_id, user_id).await.unwrap();
}

#[tokio::test]
async fn duplicate_account_names_conflict_case_insensitively() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    new_account(&ledger, user_id, "Checking", 0).await;

    let err = ledger
        .create_account(NewAccountCmd {
            user_id,
            name: "checking".to_string(),
            account_number: None,
            kind: AccountKind::Cash,
            balance_minor: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ExistingKey(_)));
}

#[tokio::test]
async fn listing_paginates_twenty_per_page() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 0).await;

    for _ in 0..25 {
        ledger
            .create_transaction(income(account_id, 100), user_id)
            .await
            .unwrap();
    }

    let filter = TransactionListFilter::default();
    let first = ledger.list_transactions(user_id, &filter, 1).await.unwrap();
    assert_eq!(first.total, 25);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.data.len(), 20);

    let second = ledger.list_transactions(user_id, &filter, 2).await.unwrap();
    assert_eq!(second.data.len(), 5);
}

#[tokio::test]
async fn listing_filters_by_kind_and_amount() {
    let (ledger, _db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 0).await;

    ledger
        .create_transaction(income(account_id, 1000), user_id)
        .await
        .unwrap();
    ledger
        .create_transaction(expense(account_id, 300), user_id)
        .await
        .unwrap();
    ledger
        .create_transaction(expense(account_id, 50), user_id)
        .await
        .unwrap();

    let expenses = ledger
        .list_transactions(
            user_id,
            &TransactionListFilter {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
            1,
        )
        .await
        .unwrap();
    assert_eq!(expenses.total, 2);

    let large = ledger
        .list_transactions(
            user_id,
            &TransactionListFilter {
                min_amount: Some(200),
                ..Default::default()
            },
            1,
        )
        .await
        .unwrap();
    assert_eq!(large.total, 2);
}

#[tokio::test]
async fn listing_only_shows_the_callers_transactions() {
    let (ledger, db, user_id) = ledger_with_db().await;
    let account_id = new_account(&ledger, user_id, "Checking", 0).await;
    ledger
        .create_transaction(income(account_id, 1000), user_id)
        .await
        .unwrap();

    let other_user = insert_user(&db, "bob", "bob@example.com").await;
    let page = ledger
        .list_transactions(other_user, &TransactionListFilter::default(), 1)
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}
