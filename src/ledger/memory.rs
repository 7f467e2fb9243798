//! In-process ledger store
//!
//! A small storage engine honouring the same contract as the PostgreSQL
//! store: per-row exclusive locks taken by balance updates and held until the
//! transaction ends, writes staged per transaction and published on commit
//! (read committed), sequence ids that are consumed even on rollback.
//!
//! Used by the test suite and for running the engine without a database.
//! Supports fault injection through [`FailPoint`] and failing commit/rollback.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::error::LedgerError;
use super::models::{Account, Entry, Transfer};
use super::store::{LedgerTx, Store, Transactional};

/// Ledger operation that can be forced to fail once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    CreateTransfer,
    CreateEntry,
    ApplyBalanceDelta,
}

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

struct Inner {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashMap<i64, Arc<RowLock<()>>>>,
    account_seq: AtomicI64,
    entry_seq: AtomicI64,
    transfer_seq: AtomicI64,
    fail_point: Mutex<Option<FailPoint>>,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
}

impl Inner {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_lock(&self, id: i64) -> Arc<RowLock<()>> {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(id).or_default().clone()
    }

    /// Consume the armed fail point if it matches
    fn trip(&self, point: FailPoint) -> Result<(), LedgerError> {
        let mut armed = self.fail_point.lock().unwrap_or_else(PoisonError::into_inner);
        if *armed == Some(point) {
            *armed = None;
            return Err(LedgerError::Storage(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    fn require_account(&self, id: i64) -> Result<(), LedgerError> {
        if self.tables().accounts.contains_key(&id) {
            Ok(())
        } else {
            Err(LedgerError::AccountNotFound(id))
        }
    }
}

/// Shared handle to an in-process ledger
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                row_locks: Mutex::new(HashMap::new()),
                account_seq: AtomicI64::new(1),
                entry_seq: AtomicI64::new(1),
                transfer_seq: AtomicI64::new(1),
                fail_point: Mutex::new(None),
                fail_commit: AtomicBool::new(false),
                fail_rollback: AtomicBool::new(false),
            }),
        }
    }

    /// Insert an account outside any transaction.
    ///
    /// Owners hold at most one account per currency.
    pub fn create_account(
        &self,
        owner: &str,
        currency: &str,
        balance: i64,
    ) -> Result<Account, LedgerError> {
        let mut tables = self.inner.tables();
        if tables
            .accounts
            .values()
            .any(|a| a.owner == owner && a.currency == currency)
        {
            return Err(LedgerError::Storage(format!(
                "duplicate key value violates unique constraint \"owner_currency_key\": ({owner}, {currency})"
            )));
        }

        let account = Account {
            id: self.inner.account_seq.fetch_add(1, Ordering::SeqCst),
            owner: owner.to_string(),
            balance,
            currency: currency.to_string(),
            created_at: Utc::now(),
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Committed state of an account
    pub fn get_account(&self, id: i64) -> Result<Account, LedgerError> {
        self.inner
            .tables()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Committed entries of an account, oldest first
    pub fn entries_for(&self, account_id: i64) -> Vec<Entry> {
        self.inner
            .tables()
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.inner.tables().entries.clone()
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.inner.tables().transfers.clone()
    }

    pub fn get_transfer(&self, id: i64) -> Option<Transfer> {
        self.inner
            .tables()
            .transfers
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Make the next operation of this kind fail, in whichever transaction reaches it first
    pub fn fail_at(&self, point: FailPoint) {
        *self
            .inner
            .fail_point
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(point);
    }

    pub fn fail_next_commit(&self) {
        self.inner.fail_commit.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_rollback(&self) {
        self.inner.fail_rollback.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<MemoryTx, LedgerError> {
        Ok(MemoryTx {
            inner: Arc::clone(&self.inner),
            locks: HashMap::new(),
            deltas: BTreeMap::new(),
            entries: Vec::new(),
            transfers: Vec::new(),
        })
    }
}

/// One open transaction against a [`MemoryStore`].
///
/// Dropping it without commit discards the staged writes and releases its
/// row locks.
pub struct MemoryTx {
    inner: Arc<Inner>,
    locks: HashMap<i64, OwnedMutexGuard<()>>,
    deltas: BTreeMap<i64, i64>,
    entries: Vec<Entry>,
    transfers: Vec<Transfer>,
}

impl MemoryTx {
    /// Committed row plus this transaction's own pending delta
    fn snapshot(&self, id: i64) -> Result<Account, LedgerError> {
        let mut account = self
            .inner
            .tables()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.balance += self.deltas.get(&id).copied().unwrap_or(0);
        Ok(account)
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn fetch_account(&mut self, id: i64) -> Result<Account, LedgerError> {
        self.snapshot(id)
    }

    async fn apply_balance_delta(&mut self, id: i64, delta: i64) -> Result<Account, LedgerError> {
        self.inner.trip(FailPoint::ApplyBalanceDelta)?;
        self.inner.require_account(id)?;

        if !self.locks.contains_key(&id) {
            let lock = self.inner.row_lock(id);
            let guard = lock.lock_owned().await;
            self.locks.insert(id, guard);
        }

        // Row lock held: the committed balance cannot move under us
        let out_of_range = || LedgerError::Storage("bigint out of range".to_string());
        let mut account = self.snapshot(id)?;
        account.balance = account.balance.checked_add(delta).ok_or_else(out_of_range)?;
        let pending = self.deltas.entry(id).or_insert(0);
        *pending = pending.checked_add(delta).ok_or_else(out_of_range)?;
        Ok(account)
    }

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, LedgerError> {
        self.inner.trip(FailPoint::CreateEntry)?;
        self.inner.require_account(account_id)?;

        let entry = Entry {
            id: self.inner.entry_seq.fetch_add(1, Ordering::SeqCst),
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, LedgerError> {
        self.inner.trip(FailPoint::CreateTransfer)?;
        self.inner.require_account(from_account_id)?;
        self.inner.require_account(to_account_id)?;
        if amount <= 0 {
            return Err(LedgerError::Storage(
                "new row violates check constraint \"transfers_amount_check\"".to_string(),
            ));
        }

        let transfer = Transfer {
            id: self.inner.transfer_seq.fetch_add(1, Ordering::SeqCst),
            from_account_id,
            to_account_id,
            amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }
}

#[async_trait]
impl Transactional for MemoryTx {
    async fn commit(mut self) -> Result<(), LedgerError> {
        if self.inner.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Storage(
                "commit failed: connection reset by peer".to_string(),
            ));
        }

        {
            let mut tables = self.inner.tables();
            for (id, delta) in &self.deltas {
                if let Some(account) = tables.accounts.get_mut(id) {
                    account.balance += delta;
                }
            }
            tables.entries.append(&mut self.entries);
            tables.transfers.append(&mut self.transfers);
        }

        // Publish before unlocking so the next lock holder sees the new balance
        self.locks.clear();
        Ok(())
    }

    async fn rollback(self) -> Result<(), LedgerError> {
        if self.inner.fail_rollback.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Storage(
                "rollback failed: connection reset by peer".to_string(),
            ));
        }
        Ok(())
    }
}
