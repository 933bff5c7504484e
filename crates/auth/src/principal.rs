use crate::{Claims, Role};

/// Authenticated identity attached to a single request.
///
/// Built fresh from a verified token (or from the identity store at mint
/// time) and never persisted. Fields are private so a principal cannot be
/// altered once a request has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: String,
    roles: Vec<Role>,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            roles: vec![role],
        }
    }

    pub fn with_roles(subject: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }

    /// Build a principal from verified claims.
    ///
    /// Role names that do not parse are dropped (and logged); the token's roles
    /// are trusted as-is and never re-resolved against the identity store.
    pub fn from_claims(claims: &Claims) -> Self {
        let roles = claims
            .roles
            .iter()
            .filter_map(|name| match name.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    tracing::warn!(subject = %claims.sub, error = %e, "ignoring unknown role claim");
                    None
                }
            })
            .collect();

        Self {
            subject: claims.sub.clone(),
            roles,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The principal's single role, if any survived parsing.
    pub fn role(&self) -> Option<Role> {
        self.roles.first().copied()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Role names in claim form (e.g. `"ADMIN"`).
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }
}
