use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod balance;
pub mod system;
pub mod transactions;

/// Public credential endpoints, mounted under `/auth`.
pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Endpoints that require a bound `CurrentUser`, mounted under `/api`.
pub fn api_router() -> Router {
    Router::new()
        .route("/me", get(system::me))
        .nest("/transactions", transactions::router())
        .route("/balance", get(balance::balance))
}
