//! Transfer handler

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, error_codes, ok};
use crate::account::AccountRepository;
use crate::account::validation::{Currency, validate_account_id, validate_amount};
use crate::ledger::{Account, TransferTxParams, TransferTxResult};
use crate::token::Payload;

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub currency: String,
}

/// Account `id` must exist and hold `currency`
async fn valid_account(state: &AppState, id: i64, currency: Currency) -> Result<Account, ApiError> {
    let account = AccountRepository::get(state.db.pool(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(error_codes::ACCOUNT_NOT_FOUND, format!("account {} not found", id)))?;

    if account.currency != currency.as_str() {
        return Err(ApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            error_codes::CURRENCY_MISMATCH,
            format!(
                "account [{}] currency mismatch: {} vs {}",
                account.id, account.currency, currency
            ),
        ));
    }
    Ok(account)
}

/// POST /transfers
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Payload>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferTxResult> {
    let from_account_id = validate_account_id(req.from_account_id)?;
    let to_account_id = validate_account_id(req.to_account_id)?;
    let amount = validate_amount(req.amount)?;
    let currency: Currency = req.currency.parse()?;

    let from_account = valid_account(&state, from_account_id, currency).await?;
    if from_account.owner != auth.username {
        return ApiError::unauthorized(
            error_codes::NOT_OWNER,
            "from account doesn't belong to the authenticated user",
        )
        .into_err();
    }
    valid_account(&state, to_account_id, currency).await?;

    let result = state
        .transfer_engine
        .transfer(TransferTxParams::new(from_account_id, to_account_id, amount))
        .await?;
    ok(result)
}
