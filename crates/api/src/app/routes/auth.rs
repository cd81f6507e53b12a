use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app::dto::{self, AuthRequest, MessageResponse, TokenResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = dto::json_body(body)?;
    services.register(&body.email, &body.password).await?;

    Ok((StatusCode::CREATED, Json(MessageResponse { message: "user created" })).into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let body = dto::json_body(body)?;
    let token = services.login(&body.email, &body.password).await?;
    Ok(Json(TokenResponse { token }))
}
