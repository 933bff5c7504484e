//! HTTP application wiring (axum router, middleware stack, services).
//!
//! - `services.rs`: token codec, identity resolver and stores
//! - `routes/`: handlers, one file per resource
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router, http::StatusCode, response::Response};
use tower::ServiceBuilder;

use crate::{authz, config::ApiConfig, middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
///
/// Layer order, outermost first: request context, authentication, route
/// policy. The ownership guard is a route layer on the user-scoped routers.
pub fn build_app(config: ApiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(&config)?);
    let auth_state = middleware::AuthState {
        tokens: services.tokens.clone(),
    };
    let policy = Arc::new(authz::route_policy());

    let app = routes::router(services.identities.clone())
        .fallback(fallback)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(axum::middleware::from_fn_with_state(auth_state, middleware::authenticate))
                .layer(axum::middleware::from_fn_with_state(policy, middleware::authorize)),
        );

    Ok(app)
}

async fn fallback() -> Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "no such route")
}
