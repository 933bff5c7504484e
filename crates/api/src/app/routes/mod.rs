use axum::{Router, routing::get};

use novelly_auth::IdentityResolver;

use crate::middleware;

pub mod auth;
pub mod chapters;
pub mod library;
pub mod novels;
pub mod pages;
pub mod progress;
pub mod system;
pub mod users;

/// Router for every endpoint. Access control is applied by the caller, except
/// for the ownership guard on per-user resources, which needs the matched
/// `:user_id` and so lives here as a route layer.
pub fn router(identities: IdentityResolver) -> Router {
    let owned = library::router()
        .merge(progress::router())
        .route_layer(axum::middleware::from_fn_with_state(identities, middleware::require_owner));

    Router::new()
        .route("/health", get(system::health))
        .nest("/auth", auth::router())
        .merge(novels::router())
        .merge(chapters::router())
        .merge(pages::router())
        .merge(users::router())
        .merge(owned)
}
