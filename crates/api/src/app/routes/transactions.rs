use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;

use fintrack_core::TransactionId;
use fintrack_transactions::Transaction;

use crate::app::dto::{self, MessageResponse, TransactionRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route(
            "/:id",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
}

fn parse_id(raw: &str) -> Result<TransactionId, ApiError> {
    Ok(raw.parse::<TransactionId>()?)
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let items = services.transactions.list(user.user_id()).await?;
    Ok(Json(items))
}

pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let draft = dto::json_body(body)?.into_draft(Utc::now())?;
    let created = services.transactions.create(user.user_id(), draft).await?;

    tracing::debug!(user_id = %user.user_id(), transaction_id = %created.id, "transaction created");
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    let id = parse_id(&id)?;
    services
        .transactions
        .get(user.user_id(), id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Full replacement. A missing `date` keeps the stored one.
pub async fn update_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    body: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<Transaction>, ApiError> {
    let id = parse_id(&id)?;
    let request = dto::json_body(body)?;

    let existing = services
        .transactions
        .get(user.user_id(), id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let draft = request.into_draft(existing.date)?;
    let updated = services.transactions.update(user.user_id(), id, draft).await?;
    Ok(Json(updated))
}

pub async fn delete_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    services.transactions.delete(user.user_id(), id).await?;
    Ok(Json(MessageResponse {
        message: "transaction deleted",
    }))
}
