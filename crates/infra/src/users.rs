//! Account directory: the identity store behind login, registration and
//! ownership checks.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use novelly_auth::{Identity, IdentityStore, Role};
use novelly_core::{DomainError, DomainResult, Entity, UserId};

use crate::store::{EntityStore, IdSequence, InMemoryStore};

/// Stored account. Never serialized as-is: it carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Entity for UserRecord {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.user_id
    }
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            subject: self.username.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: InMemoryStore<UserRecord>,
    ids: IdSequence,
    // Serializes the uniqueness check with the insert.
    register_lock: Mutex<()>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account. Usernames and emails are unique (emails compared
    /// case-insensitively).
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password_hash: String,
        role: Role,
    ) -> DomainResult<UserRecord> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username is required"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("a valid email is required"));
        }

        let _guard = self
            .register_lock
            .lock()
            .map_err(|_| DomainError::conflict("user directory is unavailable"))?;

        if self.find_by_username(username).is_some() {
            return Err(DomainError::conflict("username already taken"));
        }
        if self.find_by_email(email).is_some() {
            return Err(DomainError::conflict("email already registered"));
        }

        let record = UserRecord {
            user_id: UserId::new(self.ids.next()),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at: Utc::now(),
        };
        self.users.upsert(record.clone());

        tracing::info!(user_id = %record.user_id, username = %record.username, role = %record.role, "user registered");
        Ok(record)
    }

    pub fn get(&self, id: UserId) -> Option<UserRecord> {
        self.users.get(id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.users.find(|u| u.username == username)
    }

    pub fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users.find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Login lookup: email first, then username.
    pub fn find_by_login(&self, email_or_username: &str) -> Option<UserRecord> {
        let key = email_or_username.trim();
        self.find_by_email(key).or_else(|| self.find_by_username(key))
    }

    /// All accounts ordered by id.
    pub fn list(&self) -> Vec<UserRecord> {
        let mut users = self.users.list();
        users.sort_by_key(|u| u.user_id);
        users
    }
}

impl IdentityStore for UserDirectory {
    fn find_by_subject(&self, subject: &str) -> Option<Identity> {
        self.find_by_username(subject).map(|u| u.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        let dir = UserDirectory::new();
        dir.register("alice", "alice@example.com", "h1".into(), Role::User).unwrap();
        dir.register("root", "root@example.com", "h2".into(), Role::Admin).unwrap();
        dir
    }

    #[test]
    fn ids_are_sequential() {
        let dir = directory();
        let ids: Vec<i64> = dir.list().iter().map(|u| u.user_id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn duplicates_conflict() {
        let dir = directory();
        assert!(matches!(
            dir.register("alice", "other@example.com", "h".into(), Role::User),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            dir.register("alice2", "ALICE@example.com", "h".into(), Role::User),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn invalid_input_is_rejected() {
        let dir = UserDirectory::new();
        assert!(matches!(
            dir.register(" ", "x@example.com", "h".into(), Role::User),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            dir.register("x", "not-an-email", "h".into(), Role::User),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn login_lookup_prefers_email_then_username() {
        let dir = directory();
        assert_eq!(dir.find_by_login("root@example.com").unwrap().username, "root");
        assert_eq!(dir.find_by_login("alice").unwrap().email, "alice@example.com");
        assert!(dir.find_by_login("carol").is_none());
    }

    #[test]
    fn acts_as_identity_store() {
        let dir = directory();
        let identity = dir.find_by_subject("root").unwrap();
        assert_eq!(identity.user_id, UserId::new(2));
        assert_eq!(identity.role, Role::Admin);
        assert!(dir.find_by_subject("root@example.com").is_none());
    }
}
