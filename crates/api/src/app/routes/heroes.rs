use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde_json::json;

use heroes_core::RecordId;
use heroes_infra::Filter;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::AuthenticatedUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_heroes).post(create_hero))
        .route("/:id", patch(update_hero).delete(delete_hero))
}

pub async fn list_heroes(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ListHeroesQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let page = match query.page() {
        Ok(page) => page,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let filter = match query.name_filter() {
        Ok(Some(term)) => Filter::all().contains("nome", term),
        Ok(None) => Filter::all(),
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.heroes.read(&filter, page).await
    {
        Ok(heroes) => (StatusCode::OK, Json(heroes)).into_response(),
        Err(e) => errors::internal_error("listing heroes failed", &e),
    }
}

pub async fn create_hero(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<dto::CreateHeroRequest>, JsonRejection>,
) -> axum::response::Response {
    let hero = match body.map_err(|e| errors::bad_request(e.body_text())) {
        Ok(Json(body)) => match body.into_hero() {
            Ok(hero) => hero,
            Err(e) => return errors::domain_error_to_response(e),
        },
        Err(resp) => return resp,
    };

    match services.heroes.create(hero).await {
        Ok(stored) => {
            tracing::info!(
                id = %stored.id,
                by = %user.username(),
                user_id = %user.id(),
                "hero created"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Heroi cadastrado com sucesso",
                    "_id": stored.id,
                })),
            )
                .into_response()
        }
        Err(e) => errors::internal_error("creating hero failed", &e),
    }
}

pub async fn update_hero(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<AuthenticatedUser>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<dto::UpdateHeroRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch = match body {
        Ok(Json(body)) => match body.into_patch() {
            Ok(patch) => patch,
            Err(e) => return errors::domain_error_to_response(e),
        },
        Err(e) => return errors::bad_request(e.body_text()),
    };

    match services.heroes.update(&id, &patch, false).await {
        Ok(outcome) if outcome.is_exactly_one() => {
            tracing::info!(%id, by = %user.username(), "hero updated");
            (
                StatusCode::OK,
                Json(json!({ "message": "Heroi atualizado com sucesso" })),
            )
                .into_response()
        }
        Ok(outcome) => {
            tracing::debug!(%id, affected = outcome.affected, "update matched no single hero");
            errors::id_not_found()
        }
        Err(e) => errors::internal_error("updating hero failed", &e),
    }
}

pub async fn delete_hero(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<AuthenticatedUser>,
    id: Result<Path<String>, PathRejection>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.heroes.delete(Some(&id)).await {
        Ok(outcome) if outcome.is_exactly_one() => {
            tracing::info!(%id, by = %user.username(), "hero removed");
            (
                StatusCode::OK,
                Json(json!({ "message": "Heroi removido com sucesso" })),
            )
                .into_response()
        }
        Ok(outcome) => {
            tracing::debug!(%id, affected = outcome.affected, "delete matched no single hero");
            errors::id_not_found()
        }
        Err(e) => errors::internal_error("removing hero failed", &e),
    }
}

fn parse_id(id: Result<Path<String>, PathRejection>) -> Result<RecordId, axum::response::Response> {
    let Path(raw) = id.map_err(|e| errors::bad_request(e.body_text()))?;
    raw.parse::<RecordId>()
        .map_err(errors::domain_error_to_response)
}
