//! The route access table.
//!
//! Rules are evaluated top to bottom and the first match wins, so role-gated
//! writes are declared before the broader read rules on the same prefix.
//! Anything unmatched requires authentication.

use novelly_auth::{HttpMethod, Policy, Role};

const GET: Option<HttpMethod> = Some(HttpMethod::Get);
const POST: Option<HttpMethod> = Some(HttpMethod::Post);
const PUT: Option<HttpMethod> = Some(HttpMethod::Put);
const DELETE: Option<HttpMethod> = Some(HttpMethod::Delete);
const ANY: Option<HttpMethod> = None;

pub fn route_policy() -> Policy {
    Policy::new()
        .permit(GET, &["/health"])
        // Accounts
        .permit(POST, &["/auth/login", "/auth/register", "/auth/hash"])
        .permit(GET, &["/auth/inspect"])
        .authenticated(ANY, &["/auth/**"])
        // Files and static assets
        .permit(
            GET,
            &["/pages/file", "/pages/file/**", "/", "/index.html", "/css/**", "/js/**", "/assets/**"],
        )
        // Catalog writes
        .require_role(POST, &["/novels", "/novels/upload", "/novels/*/chapters"], Role::Admin)
        .require_role(PUT, &["/novels/*", "/novels/*/chapters/*"], Role::Admin)
        .require_role(DELETE, &["/novels/*", "/novels/*/chapters/*"], Role::Admin)
        .require_role(POST, &["/pages/upload", "/pages/upload-multiple"], Role::Admin)
        .require_role(DELETE, &["/pages/*"], Role::Admin)
        // Catalog reads
        .permit(GET, &["/novels/**"])
        .authenticated(GET, &["/chapters/**", "/pages"])
        // Per-user resources; ownership is checked by the route layer
        .authenticated(GET, &["/users/*/progress", "/users/*/progress/*", "/users/*/library", "/users/*/library/*/check"])
        .authenticated(POST, &["/users/*/progress", "/users/*/library/*"])
        .authenticated(DELETE, &["/users/*/progress/*", "/users/*/library/*"])
        .require_role(ANY, &["/users/**"], Role::Admin)
}
