//! Service wiring: the token codec, identity resolver and in-memory stores
//! shared by every handler.

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use thiserror::Error;

use novelly_auth::{IdentityError, IdentityResolver, IdentityStore, Role, TokenCodec, TokenError, hash_password};
use novelly_core::{DomainError, DomainResult};
use novelly_infra::{Catalog, FileRoot, ReadingShelf, UserDirectory, UserRecord};

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

pub struct AppServices {
    pub tokens: TokenCodec,
    pub token_ttl: Duration,
    pub users: Arc<UserDirectory>,
    pub identities: IdentityResolver,
    pub catalog: Catalog,
    pub shelf: ReadingShelf,
    pub files: FileRoot,
}

impl AppServices {
    /// Mint a token for a stored account. Roles come from the account as it is
    /// now and travel inside the token until it expires.
    pub fn issue_token(&self, user: &UserRecord) -> Result<String, IssueError> {
        let principal = self.identities.resolve(&user.username)?;
        Ok(self.tokens.mint(&principal, self.token_ttl)?)
    }

    pub fn find_user_by_subject(&self, subject: &str) -> Option<UserRecord> {
        let identity = self.identities.resolve_identity(subject).ok()?;
        self.users.get(identity.user_id)
    }

    /// Create the configured administrator unless an account with that
    /// username already exists.
    fn seed_admin(&self, username: &str, email: &str, password: &str) -> anyhow::Result<()> {
        if self.users.find_by_username(username).is_some() {
            return Ok(());
        }

        let hash = hash_password(password).context("failed to hash admin password")?;
        match self.users.register(username, email, hash, Role::Admin) {
            Ok(user) => {
                tracing::info!(user_id = %user.user_id, username = %user.username, "admin account seeded");
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!("failed to seed admin account: {e}")),
        }
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("tokens", &self.tokens)
            .field("token_ttl", &self.token_ttl)
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}

pub fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let tokens = TokenCodec::new(&config.jwt_secret).context("invalid JWT_SECRET")?;
    if config.token_ttl <= Duration::zero() {
        anyhow::bail!("token lifetime must be positive");
    }

    let users = Arc::new(UserDirectory::new());
    let store: Arc<dyn IdentityStore> = users.clone();

    let services = AppServices {
        tokens,
        token_ttl: config.token_ttl,
        users,
        identities: IdentityResolver::new(store),
        catalog: Catalog::new(),
        shelf: ReadingShelf::new(),
        files: FileRoot::new(&config.upload_dir),
    };

    if let Some(admin) = &config.admin {
        services.seed_admin(&admin.username, &admin.email, &admin.password)?;
    }

    tracing::info!(upload_root = %services.files.root().display(), "services ready");
    Ok(services)
}

/// Registration as exposed over HTTP: every self-registered account is a
/// plain reader.
pub fn register_reader(
    services: &AppServices,
    username: &str,
    email: &str,
    password_hash: String,
) -> DomainResult<UserRecord> {
    services
        .users
        .register(username, email, password_hash, Role::User)
        .map_err(|e| match e {
            // Duplicates are reported as a bad request, not a conflict.
            DomainError::Conflict(msg) => DomainError::validation(msg),
            other => other,
        })
}
