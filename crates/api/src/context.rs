use novelly_auth::{Principal, Role};
use novelly_observability::RequestId;

/// Per-request metadata, attached before authentication runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: RequestId,
}

impl RequestContext {
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

/// Authenticated identity for a request.
///
/// Present in the request extensions only when a valid token was supplied;
/// its absence means the request is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn subject(&self) -> &str {
        self.principal.subject()
    }

    pub fn roles(&self) -> &[Role] {
        self.principal.roles()
    }
}
