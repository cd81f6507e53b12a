use axum::{Json, extract::Extension, http::StatusCode};

use crate::app::dto::MeResponse;
use crate::context::CurrentUser;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id().get(),
    })
}
