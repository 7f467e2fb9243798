//! Transfer Orchestrator
//!
//! Moves money between two accounts inside one transaction:
//!
//! 1. insert the transfer record
//! 2. insert the debit entry (−amount) on the from-account
//! 3. insert the credit entry (+amount) on the to-account
//! 4. apply both balance deltas, **lower account id first**
//!
//! Step 4 takes the row locks. Every transfer locks its two rows in ascending
//! id order whatever its direction, so two transfers racing in opposite
//! directions over the same pair queue on the same first row instead of each
//! holding one row and waiting for the other.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::error::LedgerError;
use super::models::{Account, TransferTxParams, TransferTxResult};
use super::state::{TransferProgress, TransferState};
use super::store::{LedgerTx, Store, run_in_transaction};

/// Execute one transfer atomically against `store`.
///
/// `amount` must be positive; a self-transfer is allowed and nets to zero.
/// No idempotency: every successful call creates a new transfer record.
pub async fn transfer_tx<S>(store: &S, params: TransferTxParams) -> Result<TransferTxResult, LedgerError>
where
    S: Store + ?Sized,
{
    transfer_tx_tracked(store, params, &TransferProgress::new()).await
}

/// [`transfer_tx`] reporting its state transitions into `progress`
pub async fn transfer_tx_tracked<S>(
    store: &S,
    params: TransferTxParams,
    progress: &TransferProgress,
) -> Result<TransferTxResult, LedgerError>
where
    S: Store + ?Sized,
{
    run_transfer(store, params, progress, None).await
}

/// One transfer attempt. `deadline` bounds the steps inside the transaction;
/// the commit is never cut short.
async fn run_transfer<S>(
    store: &S,
    params: TransferTxParams,
    progress: &TransferProgress,
    deadline: Option<Duration>,
) -> Result<TransferTxResult, LedgerError>
where
    S: Store + ?Sized,
{
    if params.amount <= 0 {
        progress.advance(TransferState::Failed);
        progress.advance(TransferState::RolledBack);
        return Err(LedgerError::InvalidAmount(params.amount));
    }

    let unit_progress = progress.clone();
    let outcome = run_in_transaction(store, move |q| {
        Box::pin(async move {
            let steps = execute_steps(q, params, &unit_progress);
            match deadline {
                None => steps.await,
                Some(limit) => match tokio::time::timeout(limit, steps).await {
                    Ok(result) => result,
                    Err(_) => Err(LedgerError::Timeout(limit)),
                },
            }
        })
    })
    .await;

    match &outcome {
        Ok(result) => {
            progress.advance(TransferState::Committed);
            info!(
                transfer_id = result.transfer.id,
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                "Transfer committed"
            );
        }
        Err(LedgerError::Rollback { .. }) => {
            let reached = progress.current();
            progress.advance(TransferState::Failed);
            error!(
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                reached = %reached,
                "Transfer failed and rollback failed - ledger state uncertain"
            );
        }
        Err(e) => {
            let reached = progress.current();
            progress.advance(TransferState::Failed);
            progress.advance(TransferState::RolledBack);
            warn!(
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                reached = %reached,
                error = %e,
                code = e.code(),
                "Transfer rolled back"
            );
        }
    }

    outcome
}

/// Body of the unit of work
async fn execute_steps(
    q: &mut dyn LedgerTx,
    params: TransferTxParams,
    progress: &TransferProgress,
) -> Result<TransferTxResult, LedgerError> {
    let TransferTxParams {
        from_account_id,
        to_account_id,
        amount,
    } = params;

    let transfer = q
        .create_transfer(from_account_id, to_account_id, amount)
        .await?;
    progress.advance(TransferState::TransferInserted);

    let from_entry = q.create_entry(from_account_id, -amount).await?;
    let to_entry = q.create_entry(to_account_id, amount).await?;
    progress.advance(TransferState::EntriesInserted);

    let (from_account, to_account) = if from_account_id < to_account_id {
        add_money(q, from_account_id, -amount, to_account_id, amount).await?
    } else {
        let (to_account, from_account) =
            add_money(q, to_account_id, amount, from_account_id, -amount).await?;
        if params.is_self_transfer() {
            // Both snapshots are the same row; report its final state twice
            (from_account.clone(), from_account)
        } else {
            (from_account, to_account)
        }
    };
    progress.advance(TransferState::BalancesUpdated);

    Ok(TransferTxResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}

/// Apply two balance deltas in the given order, returning the snapshots in
/// the same order
async fn add_money(
    q: &mut dyn LedgerTx,
    account_id1: i64,
    amount1: i64,
    account_id2: i64,
    amount2: i64,
) -> Result<(Account, Account), LedgerError> {
    let account1 = q.apply_balance_delta(account_id1, amount1).await?;
    let account2 = q.apply_balance_delta(account_id2, amount2).await?;
    Ok((account1, account2))
}

/// Transfer entry point bound to a store, with an optional per-transfer deadline
pub struct TransferEngine<S: Store> {
    store: Arc<S>,
    timeout: Option<Duration>,
}

impl<S: Store> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: Store> TransferEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Roll back transfers whose steps take longer than `timeout`.
    ///
    /// The deadline covers the statements inside the transaction, not
    /// `begin` or `commit`. Once the steps succeed the commit runs to
    /// completion, so [`LedgerError::Timeout`] always means nothing was
    /// written and a retry cannot duplicate the transfer.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn transfer(&self, params: TransferTxParams) -> Result<TransferTxResult, LedgerError> {
        run_transfer(self.store.as_ref(), params, &TransferProgress::new(), self.timeout).await
    }
}
