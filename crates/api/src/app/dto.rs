use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use novelly_auth::Claims;
use novelly_core::UserId;
use novelly_infra::{LibraryEntry, Novel, UserRecord};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_or_username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct HashRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub novel_id: Option<i64>,
    pub chapter_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub path: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Public view of an account (no password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<&UserRecord> for UserDto {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserDto,
}

/// Library entry with the novel it points at (absent if since deleted).
#[derive(Debug, Serialize)]
pub struct LibraryItem {
    #[serde(flatten)]
    pub entry: LibraryEntry,
    pub novel: Option<Novel>,
}

/// Decoded claims as reported by the inspection endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInspection {
    pub subject: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expiration: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
    pub expired: bool,
}

impl TokenInspection {
    pub fn new(claims: Claims, now: DateTime<Utc>) -> Self {
        Self {
            issued_at: claims.issued_at(),
            expiration: claims.expires_at(),
            expired: claims.is_expired_at(now),
            subject: claims.sub,
            roles: claims.roles,
        }
    }
}
