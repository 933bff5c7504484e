//! Page listing and the guarded file server. Upload mechanics are not served.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/pages", get(list_pages))
        .route("/pages/file", get(file_by_query))
        .route("/pages/file/*path", get(file_by_path))
        .route("/pages/:page_id", delete(delete_page))
}

pub async fn list_pages() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "items": [] }))).into_response()
}

pub async fn file_by_query(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::FileQuery>,
) -> Response {
    match query.path {
        Some(path) => serve_file(&services, &path).await,
        None => errors::json_error(StatusCode::BAD_REQUEST, "invalid_path", "path is required"),
    }
}

pub async fn file_by_path(
    Extension(services): Extension<Arc<AppServices>>,
    Path(path): Path<String>,
) -> Response {
    serve_file(&services, &path).await
}

/// Acknowledged without effect; pages have no server-side records.
pub async fn delete_page(Path(page_id): Path<String>) -> Response {
    tracing::debug!(page_id = %page_id, "page delete acknowledged");
    StatusCode::NO_CONTENT.into_response()
}

async fn serve_file(services: &AppServices, relative: &str) -> Response {
    let resolved = match services.files.resolve(relative) {
        Ok(path) => path,
        Err(e) => return errors::file_error_to_response(e),
    };

    match tokio::fs::read(&resolved).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(&resolved))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::debug!(path = %resolved.display(), error = %e, "file not served");
            errors::not_found("file")
        }
    }
}

/// Guessed from the extension; text types are served as UTF-8.
fn content_type(path: &FsPath) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT && mime.get_param(mime_guess::mime::CHARSET).is_none() {
        format!("{mime}; charset=utf-8")
    } else {
        mime.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type(FsPath::new("a/b.PNG")), "image/png");
        assert_eq!(content_type(FsPath::new("cover.jpeg")), "image/jpeg");
        assert_eq!(content_type(FsPath::new("notes.txt")), "text/plain; charset=utf-8");
        assert_eq!(content_type(FsPath::new("chapter.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(FsPath::new("cover.webp")), "image/webp");
        assert_eq!(content_type(FsPath::new("book.pdf")), "application/pdf");
        assert_eq!(content_type(FsPath::new("blob")), "application/octet-stream");
    }
}
