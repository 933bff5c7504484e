//! Process configuration, read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

use novelly_auth::MIN_SECRET_LEN;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TTL_SECS: i64 = 3600;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEV_JWT_SECRET: &str = "novelly-dev-secret-do-not-use-in-production";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Account created at startup so a fresh instance has an administrator.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub upload_dir: PathBuf,
    pub admin: Option<AdminSeed>,
}

impl ApiConfig {
    /// Defaults with the given signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::seconds(DEFAULT_TTL_SECS),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            admin: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::invalid(
                "JWT_SECRET",
                format!("must be at least {MIN_SECRET_LEN} bytes"),
            ));
        }

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let ttl_secs = match var("JWT_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| ConfigError::invalid("JWT_TTL_SECS", e.to_string()))?,
            None => DEFAULT_TTL_SECS,
        };
        if ttl_secs <= 0 {
            return Err(ConfigError::invalid("JWT_TTL_SECS", "must be positive"));
        }

        let admin = match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => {
                let email = var("ADMIN_EMAIL").unwrap_or_else(|| format!("{username}@localhost"));
                Some(AdminSeed {
                    username,
                    email,
                    password,
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::invalid(
                    "ADMIN_USERNAME",
                    "ADMIN_USERNAME and ADMIN_PASSWORD must be set together",
                ));
            }
            (None, None) => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: Duration::seconds(ttl_secs),
            upload_dir: var("UPLOAD_DIR").map_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR), PathBuf::from),
            admin,
        })
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn with_admin(
        mut self,
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.admin = Some(AdminSeed {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        });
        self
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("upload_dir", &self.upload_dir)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}
