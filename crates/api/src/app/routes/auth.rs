use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use novelly_auth::{hash_password, verify_password};
use novelly_infra::UserRecord;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};
use crate::context::PrincipalContext;
use crate::middleware::{extract_bearer, query_token};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/hash", post(hash))
        .route("/me", get(me))
        .route("/inspect", get(inspect))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> Response {
    let password = body.password;
    let hash = match blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => return errors::password_error_to_response(e),
        Err(res) => return res,
    };

    let user = match services::register_reader(&services, &body.username, &body.email, hash) {
        Ok(user) => user,
        Err(e) => return errors::domain_error_to_response(e),
    };

    auth_response(&services, &user)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> Response {
    let Some(user) = services.users.find_by_login(&body.email_or_username) else {
        tracing::debug!("login failed: unknown account");
        return invalid_credentials();
    };

    let password = body.password;
    let stored = user.password_hash.clone();
    match blocking(move || verify_password(&password, &stored)).await {
        Ok(Ok(true)) => auth_response(&services, &user),
        Ok(Ok(false)) => {
            tracing::debug!(user_id = %user.user_id, "login failed: wrong password");
            invalid_credentials()
        }
        Ok(Err(e)) => errors::password_error_to_response(e),
        Err(res) => res,
    }
}

pub async fn hash(Json(body): Json<dto::HashRequest>) -> Response {
    let password = body.password;
    match blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => (StatusCode::OK, Json(serde_json::json!({ "hash": hash }))).into_response(),
        Ok(Err(e)) => errors::password_error_to_response(e),
        Err(res) => res,
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.find_user_by_subject(principal.subject()) {
        Some(user) => (StatusCode::OK, Json(dto::UserDto::from(&user))).into_response(),
        None => errors::json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "account no longer exists",
        ),
    }
}

/// Decode a token without the expiry check, for diagnosing rejected tokens.
///
/// The signature is still verified, and nothing here authorizes anything.
pub async fn inspect(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let Some(token) = extract_bearer(&headers)
        .map(str::to_string)
        .or_else(|| query_token(&uri))
    else {
        return errors::json_error(StatusCode::BAD_REQUEST, "missing_token", "no token supplied");
    };

    match services.tokens.extract_all(&token) {
        Ok(claims) => (StatusCode::OK, Json(dto::TokenInspection::new(claims, Utc::now()))).into_response(),
        Err(e) => errors::json_error(StatusCode::UNAUTHORIZED, "invalid_token", e.to_string()),
    }
}

fn auth_response(services: &AppServices, user: &UserRecord) -> Response {
    match services.issue_token(user) {
        Ok(token) => (
            StatusCode::OK,
            Json(dto::AuthResponse {
                token,
                token_type: "Bearer",
                expires_in: services.token_ttl.num_seconds(),
                user: dto::UserDto::from(user),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(user_id = %user.user_id, error = %e, "failed to issue token");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "failed to issue token")
        }
    }
}

fn invalid_credentials() -> Response {
    errors::json_error(
        StatusCode::BAD_REQUEST,
        "invalid_credentials",
        "invalid username/email or password",
    )
}

/// Run password hashing off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
    })
}
