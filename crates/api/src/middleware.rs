use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use fintrack_auth::{JwtValidator, VerificationError};

use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Bind the bearer token's user to the request, or answer 401 without
/// calling the inner service.
pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request<Body>, next: Next) -> Response {
    let verified = extract_bearer(req.headers()).and_then(|token| state.jwt.validate(token, Utc::now()));

    let claims = match verified {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                method = %req.method(),
                path = %req.uri().path(),
                reason = %err,
                "rejected bearer token"
            );
            return unauthorized(err);
        }
    };

    req.extensions_mut().insert(CurrentUser::new(claims.user_id));
    next.run(req).await
}

fn unauthorized(err: VerificationError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": true,
            "msg": err.to_string(),
        })),
    )
        .into_response()
}

/// `Authorization: Bearer <token>`, scheme matched case-insensitively.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, VerificationError> {
    let header = headers.get(AUTHORIZATION).ok_or(VerificationError::Missing)?;
    let header = header.to_str().map_err(|_| VerificationError::Malformed)?.trim();

    if header.is_empty() || header.eq_ignore_ascii_case("bearer") {
        return Err(VerificationError::Missing);
    }

    let (scheme, token) = header.split_once(' ').ok_or(VerificationError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(VerificationError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(VerificationError::Missing);
    }

    Ok(token)
}

/// One `info` line per request: method, path, status, latency.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}
