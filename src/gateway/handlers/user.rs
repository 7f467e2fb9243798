//! User registration and login

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, error_codes, ok};
use crate::account::validation::{Email, Username, validate_full_name, validate_password};
use crate::account::{CreateUserParams, UserRepository, UserResponse};
use crate::token::{check_password, hash_password};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUserResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<UserResponse> {
    let username = Username::new(&req.username)?;
    let email = Email::new(&req.email)?;
    validate_password(&req.password)?;
    validate_full_name(&req.full_name)?;

    let hashed_password = hash_password(&req.password)?;
    let params = CreateUserParams {
        username: username.into_string(),
        hashed_password,
        full_name: req.full_name.trim().to_string(),
        email: email.into_string(),
    };

    let user = UserRepository::create(state.db.pool(), &params).await?;
    tracing::info!(username = %user.username, "User created");
    ok(user.into())
}

/// POST /users/login
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginUserRequest>,
) -> ApiResult<LoginUserResponse> {
    let username = Username::new(&req.username)?;
    validate_password(&req.password)?;

    let user = UserRepository::get_by_username(state.db.pool(), username.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found(error_codes::USER_NOT_FOUND, "user not found"))?;

    check_password(&req.password, &user.hashed_password)?;

    let (access_token, payload) = state
        .token_maker
        .create_token(&user.username, state.access_token_duration)?;

    ok(LoginUserResponse {
        access_token,
        access_token_expires_at: payload.expired_at,
        user: user.into(),
    })
}
