//! Identity resolution against the canonical account store.

use std::sync::Arc;

use thiserror::Error;

use novelly_core::UserId;

use crate::{AuthzError, Principal, Role};

/// Canonical identity as held by the account store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub subject: String,
    pub role: Role,
}

impl Identity {
    pub fn principal(&self) -> Principal {
        Principal::new(self.subject.clone(), self.role)
    }
}

/// Account store collaborator (`findBySubject`).
pub trait IdentityStore: Send + Sync {
    fn find_by_subject(&self, subject: &str) -> Option<Identity>;
}

impl<S> IdentityStore for Arc<S>
where
    S: IdentityStore + ?Sized,
{
    fn find_by_subject(&self, subject: &str) -> Option<Identity> {
        (**self).find_by_subject(subject)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity not found: {0}")]
    NotFound(String),
}

/// Maps subjects to principals.
///
/// Used when minting tokens and by the ownership guard. Token verification
/// does not consult it: roles embedded in a token are trusted until expiry.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self, subject: &str) -> Result<Principal, IdentityError> {
        self.resolve_identity(subject).map(|identity| identity.principal())
    }

    pub fn resolve_identity(&self, subject: &str) -> Result<Identity, IdentityError> {
        self.store
            .find_by_subject(subject)
            .ok_or_else(|| IdentityError::NotFound(subject.to_string()))
    }

    /// Second authorization layer for user-scoped resources: the principal's
    /// resolved id must equal the resource owner's id.
    pub fn ensure_owner(&self, principal: &Principal, owner: UserId) -> Result<(), AuthzError> {
        let identity = self.resolve_identity(principal.subject()).map_err(|e| {
            tracing::debug!(subject = principal.subject(), error = %e, "owner check: subject unresolved");
            AuthzError::forbidden("principal does not resolve to an account")
        })?;

        if identity.user_id != owner {
            tracing::debug!(
                subject = principal.subject(),
                principal_id = %identity.user_id,
                owner_id = %owner,
                "owner check: mismatch"
            );
            return Err(AuthzError::forbidden("resource belongs to another user"));
        }

        Ok(())
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}
