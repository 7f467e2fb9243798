//! Ledger store seams and the transaction runner
//!
//! A [`Store`] opens transactions. Each transaction is a fresh handle that
//! implements [`LedgerTx`] (the four ledger operations) plus
//! [`Transactional`] (commit/rollback). Units of work only ever see
//! `&mut dyn LedgerTx`, so they cannot commit or roll back on their own.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{debug, error};

use super::error::LedgerError;
use super::models::{Account, Entry, Transfer};

/// Ledger operations available inside one transaction
#[async_trait]
pub trait LedgerTx: Send {
    /// Fetch an account row by id
    async fn fetch_account(&mut self, id: i64) -> Result<Account, LedgerError>;

    /// Atomically add `delta` to the stored balance and return the updated row.
    ///
    /// Takes the row lock; it is held until the transaction ends.
    async fn apply_balance_delta(&mut self, id: i64, delta: i64) -> Result<Account, LedgerError>;

    /// Append an entry. The resulting balance sign is not checked.
    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, LedgerError>;

    /// Append a transfer record
    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, LedgerError>;
}

/// Ends a transaction
#[async_trait]
pub trait Transactional: LedgerTx + Sized {
    async fn commit(self) -> Result<(), LedgerError>;
    async fn rollback(self) -> Result<(), LedgerError>;
}

/// Transactional data store
#[async_trait]
pub trait Store: Send + Sync {
    type Tx: Transactional + 'static;

    /// Short backend name for logging
    fn name(&self) -> &'static str;

    /// Open a transaction at the store's default isolation level
    async fn begin(&self) -> Result<Self::Tx, LedgerError>;
}

/// Run `unit` inside one transaction of `store`.
///
/// - `Ok` commits; a commit failure is returned as is.
/// - `Err` rolls back and returns the original error, or
///   [`LedgerError::Rollback`] when the rollback itself fails.
///
/// No retries happen here. Dropping the returned future drops the open
/// transaction, which rolls it back.
pub async fn run_in_transaction<S, T, F>(store: &S, unit: F) -> Result<T, LedgerError>
where
    S: Store + ?Sized,
    T: Send,
    F: for<'h> FnOnce(&'h mut dyn LedgerTx) -> BoxFuture<'h, Result<T, LedgerError>> + Send,
{
    let mut tx = store.begin().await?;

    match unit(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => match tx.rollback().await {
            Ok(()) => {
                debug!(store = store.name(), error = %err, "Transaction rolled back");
                Err(err)
            }
            Err(rb_err) => {
                error!(
                    store = store.name(),
                    error = %err,
                    rollback_error = %rb_err,
                    "Rollback failed - transaction outcome unknown"
                );
                Err(LedgerError::rollback_failed(err, rb_err))
            }
        },
    }
}
