use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capability level granted to an account.
///
/// The set is closed and every account holds exactly one role. Names are
/// compared case-insensitively and the `ROLE_` authority prefix is accepted,
/// so `"admin"`, `"ADMIN"` and `"ROLE_Admin"` all parse to [`Role::Admin`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
    Creator,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Creator];

    /// Canonical (upper-case) role name, as carried in token claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Creator => "CREATOR",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("ROLE_") => &trimmed[5..],
            _ => trimmed,
        };

        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" User ".parse::<Role>().unwrap(), Role::User);
        assert_eq!("CREATOR".parse::<Role>().unwrap(), Role::Creator);
    }

    #[test]
    fn authority_prefix_is_accepted() {
        assert_eq!("ROLE_ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("role_user".parse::<Role>().unwrap(), Role::User);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!("superuser".parse::<Role>(), Err(UnknownRole("superuser".to_string())));
        assert!("ROLE_".parse::<Role>().is_err());
    }
}
