use axum::Json;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fintrack_core::DomainResult;
use fintrack_transactions::TransactionDraft;

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `/auth/register` and `/auth/login`. Missing fields read as empty
/// so they fail validation rather than deserialization.
#[derive(Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl core::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of transaction create/update. Any `user_id` in the payload is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionRequest {
    pub amount: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    /// Validate into a draft; a missing `date` becomes `default_date`.
    pub fn into_draft(self, default_date: DateTime<Utc>) -> DomainResult<TransactionDraft> {
        TransactionDraft::new(
            self.amount,
            self.kind.as_deref(),
            self.category,
            self.description,
            self.date,
            default_date,
        )
    }
}

/// Unwrap a JSON body, turning axum's rejection into a 400.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(format!("invalid request body: {}", rejection.body_text())))
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: i64,
}
