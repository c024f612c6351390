use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use heroes_auth::{Hs256Jwt, verify_password};
use heroes_core::normalize_username;
use heroes_infra::{Filter, Page};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Exchange credentials for a signed token.
///
/// Unknown user and wrong password get the same answer.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(jwt): Extension<Arc<Hs256Jwt>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let username = normalize_username(&body.username);

    let found = match services
        .users
        .read(&Filter::all().eq("username", username.clone()), Page::new(0, 1))
        .await
    {
        Ok(found) => found,
        Err(e) => return errors::internal_error("user lookup failed", &e),
    };

    let Some(user) = found
        .into_iter()
        .find(|u| verify_password(&body.password, &u.record.password))
    else {
        tracing::info!(%username, "login refused");
        return invalid_credentials();
    };

    match jwt.issue(&username, Some(user.id.into_inner())) {
        Ok(token) => (StatusCode::OK, Json(json!({ "token": token }))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "token signing failed");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}

fn invalid_credentials() -> axum::response::Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "invalid username or password",
    )
}
