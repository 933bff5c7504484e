use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Signed token payload.
///
/// Field names follow the registered JWT claim names; timestamps are seconds
/// since the Unix epoch. `roles` is a custom claim holding role names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,

    /// Issued-at, seconds since epoch.
    pub iat: i64,

    /// Expiry, seconds since epoch.
    pub exp: i64,

    /// Role names granted when the token was minted.
    pub roles: Vec<String>,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// A token is expired once `exp <= now` (no leeway).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}
