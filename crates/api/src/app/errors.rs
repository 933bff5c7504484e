use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use novelly_auth::{AuthzError, PasswordError};
use novelly_core::DomainError;
use novelly_infra::FileAccessError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    match err {
        AuthzError::Unauthenticated => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        ),
        AuthzError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn password_error_to_response(err: PasswordError) -> axum::response::Response {
    match err {
        PasswordError::Blank => json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string()),
        PasswordError::Hash(_) | PasswordError::InvalidHash(_) => {
            tracing::error!(error = %err, "password hashing failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "password processing failed")
        }
    }
}

pub fn file_error_to_response(err: FileAccessError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_path", err.to_string())
}

pub fn not_found(what: &str) -> axum::response::Response {
    domain_error_to_response(DomainError::not_found(what))
}

/// Parse a numeric path id, mapping failure to a 400 response.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: std::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(domain_error_to_response)
}
