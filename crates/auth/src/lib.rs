//! `novelly-auth`: stateless authentication/authorization core.
//!
//! This crate is decoupled from HTTP and storage: the API layer
//! feeds it token strings, request methods/paths and an identity store.

pub mod authorize;
pub mod claims;
pub mod identity;
pub mod password;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{AuthzError, Requirement, authorize};
pub use claims::Claims;
pub use identity::{Identity, IdentityError, IdentityResolver, IdentityStore};
pub use password::{PasswordError, hash_password, verify_password};
pub use policy::{HttpMethod, PathPattern, Policy, PolicyDecision, PolicyRule, is_canonical_path};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use token::{MIN_SECRET_LEN, TokenCodec, TokenError};
