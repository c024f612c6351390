use axum::Router;

pub mod auth;
pub mod heroes;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new().nest("/herois", heroes::router())
}
