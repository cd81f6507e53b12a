//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, hasher and token service, plus the register/login flows
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: AppServices) -> Router {
    let auth_state = middleware::AuthState {
        jwt: services.jwt.clone(),
    };
    let services = Arc::new(services);

    // Protected routes: the auth layer runs before any handler.
    let protected = routes::api_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth_router())
        .nest("/api", protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(Extension(services)),
        )
}
