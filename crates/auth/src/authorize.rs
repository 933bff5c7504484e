use thiserror::Error;

use crate::{Principal, Role};

/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone, authenticated or not.
    Public,
    /// Any caller with a valid principal.
    AnyAuthenticated,
    /// A principal holding exactly this role.
    RequiresRole(Role),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AuthzError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }
}

/// Evaluate a requirement against the (possibly absent) request principal.
///
/// - No IO
/// - No panics
pub fn authorize(requirement: &Requirement, principal: Option<&Principal>) -> Result<(), AuthzError> {
    match (requirement, principal) {
        (Requirement::Public, _) => Ok(()),
        (_, None) => Err(AuthzError::Unauthenticated),
        (Requirement::AnyAuthenticated, Some(_)) => Ok(()),
        (Requirement::RequiresRole(role), Some(p)) if p.has_role(*role) => Ok(()),
        (Requirement::RequiresRole(role), Some(_)) => {
            Err(AuthzError::forbidden(format!("role {role} required")))
        }
    }
}
