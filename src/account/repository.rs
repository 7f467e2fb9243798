//! Repository layer for database operations

use sqlx::PgPool;

use super::models::{CreateUserParams, User};
use super::validation::Currency;
use crate::ledger::models::{Account, Entry, Transfer};

/// CRUD failure, with the constraint violations callers map to client errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),

    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    fn classify(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return RepositoryError::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return RepositoryError::ForeignKeyViolation(db_err.message().to_string());
            }
        }
        RepositoryError::Database(e)
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            RepositoryError::UniqueViolation(_) | RepositoryError::ForeignKeyViolation(_)
        )
    }
}

/// User repository
pub struct UserRepository;

impl UserRepository {
    pub async fn create(pool: &PgPool, params: &CreateUserParams) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, hashed_password, full_name, email)
               VALUES ($1, $2, $3, $4)
               RETURNING username, hashed_password, full_name, email, password_changed_at, created_at"#,
        )
        .bind(&params.username)
        .bind(&params.hashed_password)
        .bind(&params.full_name)
        .bind(&params.email)
        .fetch_one(pool)
        .await
        .map_err(RepositoryError::classify)
    }

    pub async fn get_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT username, hashed_password, full_name, email, password_changed_at, created_at
               FROM users WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

/// Account repository. New accounts start at balance 0.
pub struct AccountRepository;

impl AccountRepository {
    pub async fn create(
        pool: &PgPool,
        owner: &str,
        currency: Currency,
    ) -> Result<Account, RepositoryError> {
        sqlx::query_as::<_, Account>(
            r#"INSERT INTO accounts (owner, balance, currency)
               VALUES ($1, 0, $2)
               RETURNING id, owner, balance, currency, created_at"#,
        )
        .bind(owner)
        .bind(currency.as_str())
        .fetch_one(pool)
        .await
        .map_err(RepositoryError::classify)
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Account>, RepositoryError> {
        let account = sqlx::query_as::<_, Account>(
            r#"SELECT id, owner, balance, currency, created_at
               FROM accounts WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Accounts of `owner`, ordered by id
    pub async fn list(
        pool: &PgPool,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, RepositoryError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"SELECT id, owner, balance, currency, created_at
               FROM accounts WHERE owner = $1
               ORDER BY id
               LIMIT $2 OFFSET $3"#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(accounts)
    }
}

pub struct TransferRepository;

impl TransferRepository {
    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Transfer>, RepositoryError> {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"SELECT id, from_account_id, to_account_id, amount, created_at
               FROM transfers WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(transfer)
    }
}

pub struct EntryRepository;

impl EntryRepository {
    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Entry>, RepositoryError> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"SELECT id, account_id, amount, created_at
               FROM entries WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(entry)
    }

    /// Entries of one account, oldest first
    pub async fn list_by_account(
        pool: &PgPool,
        account_id: i64,
    ) -> Result<Vec<Entry>, RepositoryError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"SELECT id, account_id, amount, created_at
               FROM entries WHERE account_id = $1
               ORDER BY id"#,
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_constraint_violations() {
        let err = RepositoryError::classify(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::Database(_)));
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_constraint_violation_flag() {
        assert!(RepositoryError::UniqueViolation("dup".into()).is_constraint_violation());
        assert!(RepositoryError::ForeignKeyViolation("fk".into()).is_constraint_violation());
    }
}
