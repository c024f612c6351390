use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use heroes_auth::JwtValidator;
use heroes_core::{User, normalize_username};
use heroes_infra::{Context, Filter, Page};

use crate::app::errors;
use crate::context::AuthenticatedUser;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub users: Context<User>,
}

/// Bearer-token check for every protected route.
///
/// A token is accepted only if its signature verifies and its `username`
/// (lowercased) still exists in the users store.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).ok_or_else(unauthorized)?;

    let claims = state.jwt.validate(token).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        unauthorized()
    })?;

    let username = normalize_username(&claims.username);
    let found = state
        .users
        .read(&Filter::all().eq("username", username.clone()), Page::new(0, 1))
        .await
        .map_err(|e| errors::internal_error("user lookup failed", &e))?;

    // TODO: reject users flagged inactive once the users table carries the flag.
    let Some(user) = found.into_iter().next() else {
        tracing::debug!(%username, "token for unknown user");
        return Err(unauthorized());
    };

    req.extensions_mut()
        .insert(AuthenticatedUser::new(user.id, username));

    Ok(next.run(req).await)
}

fn unauthorized() -> Response {
    errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing or invalid token")
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
