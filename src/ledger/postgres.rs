//! PostgreSQL ledger store
//!
//! Balance updates are a single `UPDATE … SET balance = balance + $1`, so the
//! read-modify-write happens inside PostgreSQL under the row lock and
//! concurrent deltas on one account never lose an update.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::error::LedgerError;
use super::models::{Account, Entry, Transfer};
use super::store::{LedgerTx, Store, Transactional};

const ACCOUNT_COLUMNS: &str = "id, owner, balance, currency, created_at";

/// Ledger store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgLedgerTx;

    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> Result<PgLedgerTx, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(PgLedgerTx { tx })
    }
}

/// One open PostgreSQL transaction.
///
/// Dropped without commit, sqlx rolls the transaction back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

/// Map a foreign-key violation on an account reference to `AccountNotFound`
fn map_account_fk(e: sqlx::Error, pick: impl FnOnce(Option<&str>) -> i64) -> LedgerError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_foreign_key_violation()
    {
        return LedgerError::AccountNotFound(pick(db_err.constraint()));
    }
    LedgerError::from(e)
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn fetch_account(&mut self, id: i64) -> Result<Account, LedgerError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn apply_balance_delta(&mut self, id: i64, delta: i64) -> Result<Account, LedgerError> {
        let sql = format!(
            "UPDATE accounts SET balance = balance + $1 WHERE id = $2 RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(delta)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, LedgerError> {
        sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (account_id, amount)
            VALUES ($1, $2)
            RETURNING id, account_id, amount, created_at
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_account_fk(e, |_| account_id))
    }

    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, LedgerError> {
        sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount, created_at
            "#,
        )
        .bind(from_account_id)
        .bind(to_account_id)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            map_account_fk(e, |constraint| match constraint {
                Some(name) if name.contains("to_account") => to_account_id,
                _ => from_account_id,
            })
        })
    }
}

#[async_trait]
impl Transactional for PgLedgerTx {
    async fn commit(self) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), LedgerError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
