//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring (one Context per backing store)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and input validation
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use heroes_auth::Hs256Jwt;
use heroes_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(config: &AppConfig, services: Arc<AppServices>) -> Router {
    let jwt = Arc::new(Hs256Jwt::new(
        config.jwt.secret.as_bytes(),
        chrono::Duration::seconds(config.jwt.ttl_secs),
    ));
    let auth_state = middleware::AuthState {
        jwt: jwt.clone(),
        users: services.users.clone(),
    };

    // Protected routes: require a valid token for a live user.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/login", post(routes::auth::login))
        .merge(protected)
        .layer(Extension(services))
        .layer(Extension(jwt))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
