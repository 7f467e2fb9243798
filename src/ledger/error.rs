//! Ledger Error Types

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the ledger store, the transaction runner and the
/// transfer orchestrator.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Referenced account id has no row
    #[error("account {0} not found")]
    AccountNotFound(i64),

    /// Amount reached the engine despite upstream validation
    #[error("transfer amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Driver, connectivity or constraint failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Unit of work failed and the rollback failed too. The durable state of
    /// the transaction is unknown.
    #[error("tx err: {source}, rb err: {rollback}")]
    Rollback {
        source: Box<LedgerError>,
        rollback: Box<LedgerError>,
    },

    /// Caller deadline elapsed before the transfer steps finished; the
    /// transaction was rolled back
    #[error("transfer timed out after {0:?}")]
    Timeout(Duration),
}

impl LedgerError {
    /// Compose a unit-of-work failure with the rollback failure that followed it
    pub fn rollback_failed(source: LedgerError, rollback: LedgerError) -> Self {
        LedgerError::Rollback {
            source: Box::new(source),
            rollback: Box::new(rollback),
        }
    }

    /// Stable error code for API responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::Rollback { .. } => "ROLLBACK_FAILED",
            LedgerError::Timeout(_) => "TIMEOUT",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::AccountNotFound(_))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Storage(e.to_string())
    }
}
