//! Request pipeline: correlation id, authentication, route policy, and the
//! ownership guard for user-scoped routes.
//!
//! Only the policy and the ownership guard reject requests. Authentication
//! never does: a missing or bad token leaves the request anonymous.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use novelly_auth::{AuthzError, IdentityResolver, Policy, Principal, TokenCodec, TokenError, is_canonical_path};
use novelly_core::UserId;
use novelly_observability::{REQUEST_ID_HEADER, RequestId};

use crate::app::errors;
use crate::context::{PrincipalContext, RequestContext};

/// Query parameter carrying a token on the inspection endpoint.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// The only route that accepts a token from the query string.
pub const INSPECT_PATH: &str = "/auth/inspect";

/// Path parameter naming the owner of a user-scoped resource.
pub const OWNER_PARAM: &str = "user_id";

type Request = axum::http::Request<axum::body::Body>;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenCodec,
}

/// Outermost layer: assigns (or adopts) the request id and wraps the rest of
/// the pipeline in a span carrying it.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::from_header(
        req.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    req.extensions_mut().insert(RequestContext::new(request_id));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path()
    );

    let mut res = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| tracing::info!(status = res.status().as_u16(), "request completed"));
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Attach a [`PrincipalContext`] when the request carries a valid token.
pub async fn authenticate(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    // An earlier pass already established the principal.
    if req.extensions().get::<PrincipalContext>().is_some() {
        return next.run(req).await;
    }

    let candidate = extract_bearer(req.headers()).map(str::to_string).or_else(|| {
        if allows_query_token(req.method(), req.uri().path()) {
            query_token(req.uri())
        } else {
            None
        }
    });

    if let Some(token) = candidate {
        match state.tokens.verify(&token) {
            Ok(claims) => {
                let principal = Principal::from_claims(&claims);
                tracing::debug!(subject = principal.subject(), "request authenticated");
                req.extensions_mut().insert(PrincipalContext::new(principal));
            }
            Err(TokenError::Expired) => {
                tracing::debug!(reason = "expired", path = %req.uri().path(), "token rejected; continuing anonymously");
            }
            Err(e) => {
                tracing::warn!(reason = %e, path = %req.uri().path(), "token rejected; continuing anonymously");
            }
        }
    }

    next.run(req).await
}

/// Enforce the static route policy. Non-canonical paths are refused with 400
/// before any rule is consulted.
pub async fn authorize(State(policy): State<Arc<Policy>>, req: Request, next: Next) -> Response {
    if !is_canonical_path(req.uri().path()) {
        tracing::warn!(path = %req.uri().path(), "non-canonical request path rejected");
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_path", "request path is not canonical");
    }

    let principal = req.extensions().get::<PrincipalContext>().map(PrincipalContext::principal);
    let decision = policy.decide(req.method().as_str(), req.uri().path());

    if let Err(e) = novelly_auth::authorize(&decision.requirement, principal) {
        tracing::debug!(
            rule = decision.rule.map_or("<default>", |r| r.pattern.as_str()),
            error = %e,
            "request denied by policy"
        );
        return errors::authz_error_to_response(e);
    }

    next.run(req).await
}

/// Route layer for `/users/:user_id/...`: the caller must own the resource.
pub async fn require_owner(
    State(identities): State<IdentityResolver>,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(raw) = params.get(OWNER_PARAM) else {
        tracing::error!(param = OWNER_PARAM, "ownership guard mounted on a route without an owner parameter");
        return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "owner parameter missing");
    };

    let owner: UserId = match raw.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let Some(ctx) = req.extensions().get::<PrincipalContext>() else {
        return errors::authz_error_to_response(AuthzError::Unauthenticated);
    };

    if let Err(e) = identities.ensure_owner(ctx.principal(), owner) {
        return errors::authz_error_to_response(e);
    }

    next.run(req).await
}

/// `Authorization: Bearer <token>`; the scheme is matched case-insensitively.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn allows_query_token(method: &Method, path: &str) -> bool {
    *method == Method::GET && path == INSPECT_PATH
}

pub(crate) fn query_token(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params
        .get(TOKEN_QUERY_PARAM)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
