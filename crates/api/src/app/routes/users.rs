use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use novelly_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Account administration (admin only, per the route policy).
pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id", get(get_user))
}

pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let items = services
        .users
        .list()
        .iter()
        .map(dto::UserDto::from)
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id: UserId = match errors::parse_id(&user_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.users.get(user_id) {
        Some(user) => (StatusCode::OK, Json(dto::UserDto::from(&user))).into_response(),
        None => errors::not_found("user"),
    }
}
