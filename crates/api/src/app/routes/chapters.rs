use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use novelly_core::{ChapterId, NovelId};
use novelly_infra::ChapterDraft;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    // `:chapter` is a chapter number on GET and a chapter id on PUT/DELETE.
    Router::new()
        .route("/novels/:novel_id/chapters", get(list_chapters).post(create_chapter))
        .route(
            "/novels/:novel_id/chapters/:chapter",
            get(get_chapter_by_number).put(update_chapter).delete(delete_chapter),
        )
        .route("/chapters/:chapter_id", get(get_chapter))
}

pub async fn list_chapters(
    Extension(services): Extension<Arc<AppServices>>,
    Path(novel_id): Path<String>,
) -> Response {
    let novel_id: NovelId = match errors::parse_id(&novel_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    if services.catalog.get_novel(novel_id).is_none() {
        return errors::not_found("novel");
    }

    let items = services.catalog.chapters_for(novel_id);
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_chapter_by_number(
    Extension(services): Extension<Arc<AppServices>>,
    Path((novel_id, number)): Path<(String, String)>,
) -> Response {
    let novel_id: NovelId = match errors::parse_id(&novel_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Ok(number) = number.trim().parse::<i32>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "chapter number must be an integer");
    };

    match services.catalog.chapter_by_number(novel_id, number) {
        Some(chapter) => (StatusCode::OK, Json(chapter)).into_response(),
        None => errors::not_found("chapter"),
    }
}

pub async fn get_chapter(
    Extension(services): Extension<Arc<AppServices>>,
    Path(chapter_id): Path<String>,
) -> Response {
    let chapter_id: ChapterId = match errors::parse_id(&chapter_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.catalog.get_chapter(chapter_id) {
        Some(chapter) => (StatusCode::OK, Json(chapter)).into_response(),
        None => errors::not_found("chapter"),
    }
}

pub async fn create_chapter(
    Extension(services): Extension<Arc<AppServices>>,
    Path(novel_id): Path<String>,
    Json(body): Json<ChapterDraft>,
) -> Response {
    let novel_id: NovelId = match errors::parse_id(&novel_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.catalog.add_chapter(novel_id, body) {
        Ok(chapter) => (StatusCode::CREATED, Json(chapter)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_chapter(
    Extension(services): Extension<Arc<AppServices>>,
    Path((novel_id, chapter_id)): Path<(String, String)>,
    Json(body): Json<ChapterDraft>,
) -> Response {
    let (novel_id, chapter_id) = match parse_pair(&novel_id, &chapter_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };

    match services.catalog.update_chapter(novel_id, chapter_id, body) {
        Ok(chapter) => (StatusCode::OK, Json(chapter)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_chapter(
    Extension(services): Extension<Arc<AppServices>>,
    Path((novel_id, chapter_id)): Path<(String, String)>,
) -> Response {
    let (novel_id, chapter_id) = match parse_pair(&novel_id, &chapter_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };

    match services.catalog.delete_chapter(novel_id, chapter_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn parse_pair(novel_id: &str, chapter_id: &str) -> Result<(NovelId, ChapterId), Response> {
    Ok((errors::parse_id(novel_id)?, errors::parse_id(chapter_id)?))
}
