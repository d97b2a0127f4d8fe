//! Errors the ledger can return.
//!
//! The variants mirror the failure taxonomy of the HTTP layer: validation
//! and reference failures are client errors detected before any write,
//! [`Database`] wraps storage failures surfaced after a rolled-back
//! transaction.
//!
//! [`Database`]: LedgerError::Database

use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed input: bad amount, unknown kind, empty name.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// A referenced account does not exist (or belongs to another user).
    #[error("Invalid account reference: {0}")]
    InvalidReference(String),
    /// A transfer without a destination, or a destination on a non-transfer.
    #[error("Invalid destination: {0}")]
    MissingDestination(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    /// The operation conflicts with existing records (e.g. deleting an
    /// account that transactions still reference).
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::MissingDestination(a), Self::MissingDestination(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
