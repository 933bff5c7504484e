use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use novelly_core::{ChapterId, DomainError, NovelId, UserId};

use crate::app::routes::library::parse_ids;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Mounted behind the ownership guard.
pub fn router() -> Router {
    Router::new()
        .route("/users/:user_id/progress", get(list_progress).post(save_progress))
        .route(
            "/users/:user_id/progress/:novel_id",
            get(get_progress).delete(delete_progress),
        )
}

pub async fn list_progress(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id: UserId = match errors::parse_id(&user_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let items = services.shelf.progress(user_id);
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_progress(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, novel_id)): Path<(String, String)>,
) -> Response {
    let (user_id, novel_id) = match parse_ids(&user_id, &novel_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };

    match services.shelf.progress_for(user_id, novel_id) {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => errors::not_found("reading progress"),
    }
}

/// Create or move the bookmark for one novel.
pub async fn save_progress(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
    Json(body): Json<dto::SaveProgressRequest>,
) -> Response {
    let user_id: UserId = match errors::parse_id(&user_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let (Some(novel_id), Some(chapter_id)) = (body.novel_id, body.chapter_id) else {
        return errors::domain_error_to_response(DomainError::validation(
            "novelId and chapterId are required",
        ));
    };
    let (novel_id, chapter_id) = (NovelId::new(novel_id), ChapterId::new(chapter_id));

    if services.catalog.get_novel(novel_id).is_none() {
        return errors::not_found("novel");
    }
    match services.catalog.get_chapter(chapter_id) {
        Some(chapter) if chapter.novel_id == novel_id => {}
        _ => return errors::not_found("chapter"),
    }

    let record = services.shelf.save_progress(user_id, novel_id, chapter_id);
    (StatusCode::OK, Json(record)).into_response()
}

pub async fn delete_progress(
    Extension(services): Extension<Arc<AppServices>>,
    Path((user_id, novel_id)): Path<(String, String)>,
) -> Response {
    let (user_id, novel_id) = match parse_ids(&user_id, &novel_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };

    match services.shelf.delete_progress(user_id, novel_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
