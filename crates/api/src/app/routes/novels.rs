use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use novelly_core::NovelId;
use novelly_infra::NovelDraft;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/novels", get(list_novels).post(create_novel))
        .route(
            "/novels/:novel_id",
            get(get_novel).put(update_novel).delete(delete_novel),
        )
}

pub async fn list_novels(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let items = services.catalog.list_novels();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_novel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: NovelId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.catalog.get_novel(id) {
        Some(novel) => (StatusCode::OK, Json(novel)).into_response(),
        None => errors::not_found("novel"),
    }
}

pub async fn create_novel(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NovelDraft>,
) -> Response {
    match services.catalog.create_novel(body) {
        Ok(novel) => {
            tracing::info!(novel_id = %novel.novel_id, title = %novel.title, "novel created");
            (StatusCode::CREATED, Json(novel)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_novel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<NovelDraft>,
) -> Response {
    let id: NovelId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.catalog.update_novel(id, body) {
        Ok(novel) => (StatusCode::OK, Json(novel)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_novel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: NovelId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    if let Err(e) = services.catalog.delete_novel(id) {
        return errors::domain_error_to_response(e);
    }
    services.shelf.forget_novel(id);
    tracing::info!(novel_id = %id, "novel deleted");

    StatusCode::NO_CONTENT.into_response()
}
