use std::sync::Arc;

use axum::{Json, extract::Extension};

use fintrack_transactions::Balance;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub async fn balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Balance>, ApiError> {
    let balance = services.transactions.balance(user.user_id()).await?;
    Ok(Json(balance))
}
