use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::state::AppState;
use super::types::{ApiError, error_codes};

const BEARER: &str = "bearer";

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::unauthorized(error_codes::MISSING_AUTH, "Missing Authorization header")
        })?;

    // Extra fields after the token are ignored
    let mut fields = auth_header.split_whitespace();
    match (fields.next(), fields.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case(BEARER) => Ok(token),
        (Some(scheme), Some(_)) => Err(ApiError::unauthorized(
            error_codes::AUTH_FAILED,
            format!("Unsupported authorization type {}", scheme),
        )),
        _ => Err(ApiError::unauthorized(
            error_codes::AUTH_FAILED,
            "Invalid authorization header format",
        )),
    }
}

/// Verify the bearer token and inject its [`Payload`](crate::token::Payload)
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let payload = state.token_maker.verify_token(token)?;

    request.extensions_mut().insert(payload);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn test_trailing_fields_ignored() {
        assert_eq!(bearer_token(&headers("Bearer abc extra")).unwrap(), "abc");
        assert_eq!(bearer_token(&headers("Bearer  abc  x y")).unwrap(), "abc");
    }

    #[test]
    fn test_missing_header() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, error_codes::MISSING_AUTH);
    }

    #[test]
    fn test_bad_formats() {
        for value in ["Bearer", "Basic dXNlcjpwdw==", "Basic a b"] {
            let err = bearer_token(&headers(value)).unwrap_err();
            assert_eq!(err.code, error_codes::AUTH_FAILED, "{value}");
        }
    }
}
