//! Account handlers. Every account belongs to the authenticated caller.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, error_codes, ok};
use crate::account::AccountRepository;
use crate::account::validation::{Currency, PageParams, validate_account_id};
use crate::ledger::Account;
use crate::token::Payload;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    pub page_id: i32,
    pub page_size: i32,
}

/// POST /accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Payload>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    let currency: Currency = req.currency.parse()?;

    let account = AccountRepository::create(state.db.pool(), &auth.username, currency).await?;
    tracing::info!(account_id = account.id, owner = %account.owner, currency = %currency, "Account created");
    ok(account)
}

/// GET /accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Payload>,
    Path(id): Path<i64>,
) -> ApiResult<Account> {
    let id = validate_account_id(id)?;

    let account = AccountRepository::get(state.db.pool(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(error_codes::ACCOUNT_NOT_FOUND, format!("account {} not found", id)))?;

    if account.owner != auth.username {
        return ApiError::unauthorized(
            error_codes::NOT_OWNER,
            "account doesn't belong to the authenticated user",
        )
        .into_err();
    }
    ok(account)
}

/// GET /accounts?page_id=&page_size=
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Payload>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Vec<Account>> {
    let page = PageParams::new(query.page_id, query.page_size)?;

    let accounts =
        AccountRepository::list(state.db.pool(), &auth.username, page.limit(), page.offset())
            .await?;
    ok(accounts)
}
