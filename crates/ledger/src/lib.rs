//! Bookkeeping core for Fino.
//!
//! The crate owns the data model (users, accounts, transactions) and the
//! [`Ledger`] coordinator, the only component allowed to mutate a transaction
//! record together with the balances of the accounts it references. Every
//! mutating operation runs inside one database transaction so a partial
//! failure never leaves balances and transaction records out of sync.

pub use accounts::{Account, AccountKind};
pub use commands::{
    AccountListFilter, AccountPatch, NewAccountCmd, NewTransactionCmd, TransactionListFilter,
    TransactionPatch,
};
pub use deltas::{Direction, balance_deltas};
pub use error::LedgerError;
pub use ops::{Ledger, LedgerBuilder, Page};
pub use transactions::{Transaction, TransactionKind};

pub mod accounts;
mod commands;
mod deltas;
mod error;
mod ops;
pub mod transactions;
pub mod users;

type ResultLedger<T> = Result<T, LedgerError>;

/// Page size used by all list endpoints.
pub const PAGE_SIZE: u64 = 20;
