use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use novelly_core::{NovelId, UserId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Mounted behind the ownership guard.
pub fn router() -> Router {
    Router::new()
        .route("/users/:user_id/library", get(list_library))
        .route(
            "/users/:user_id/library/:novel_id",
            post(add_to_library).delete(remove_from_library),
        )
        .route("/users/:user_id/library/:novel_id/check", get(check_library))
}

pub async fn list_library(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id: UserId = match errors::parse_id(&user_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let items = services
        .shelf
        .library(user_id)
        .into_iter()
        .map(|entry| dto::LibraryItem {
            novel: services.catalog.get_novel(entry.novel_id),
            entry,
        })
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn add_to_library(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, novel_id)): Path<(String, String)>,
) -> Response {
    let (user_id, novel_id) = match parse_ids(&user_id, &novel_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };
    if services.catalog.get_novel(novel_id).is_none() {
        return errors::not_found("novel");
    }

    match services.shelf.add_to_library(user_id, novel_id) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_from_library(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, novel_id)): Path<(String, String)>,
) -> Response {
    let (user_id, novel_id) = match parse_ids(&user_id, &novel_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };

    match services.shelf.remove_from_library(user_id, novel_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn check_library(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, novel_id)): Path<(String, String)>,
) -> Response {
    let (user_id, novel_id) = match parse_ids(&user_id, &novel_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };

    let in_library = services.shelf.in_library(user_id, novel_id);
    (StatusCode::OK, Json(serde_json::json!({ "inLibrary": in_library }))).into_response()
}

pub(crate) fn parse_ids(user_id: &str, novel_id: &str) -> Result<(UserId, NovelId), Response> {
    Ok((errors::parse_id(user_id)?, errors::parse_id(novel_id)?))
}
