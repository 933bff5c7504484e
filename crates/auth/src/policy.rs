//! Ordered route policy: `(method, path pattern) -> requirement`, first match wins.
//!
//! Patterns are `/`-separated. A `*` segment matches exactly one path segment;
//! a trailing `**` matches zero or more remaining segments. Everything else is
//! a literal, compared case-sensitively. Requests matching no rule fall back to
//! the policy default, which is [`Requirement::AnyAuthenticated`] unless
//! overridden: unknown routes are never public by accident.

use core::str::FromStr;

use crate::{AuthzError, Principal, Requirement, Role, authorize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
            HttpMethod::Head,
            HttpMethod::Options,
        ]
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unsupported method '{s}'"))
    }
}

impl core::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    One,
    Rest,
}

/// Compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "*" => Segment::One,
                "**" => Segment::Rest,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a canonical path.
    pub fn matches(&self, path: &str) -> bool {
        let mut parts = path.split('/').filter(|s| !s.is_empty());

        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::One => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(lit) => match parts.next() {
                    Some(part) if part == lit => {}
                    _ => return false,
                },
            }
        }

        parts.next().is_none()
    }
}

/// One row of the policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    /// `None` matches every method.
    pub method: Option<HttpMethod>,
    pub pattern: PathPattern,
    pub requirement: Requirement,
}

impl PolicyRule {
    pub fn matches(&self, method: &str, path: &str) -> bool {
        let method_ok = self
            .method
            .is_none_or(|m| m.as_str().eq_ignore_ascii_case(method));
        method_ok && self.pattern.matches(path)
    }
}

/// Outcome of looking a request up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDecision<'a> {
    /// The governing rule; `None` when the default applied.
    pub rule: Option<&'a PolicyRule>,
    pub requirement: Requirement,
}

/// Static, ordered access table.
#[derive(Debug, Clone)]
pub struct Policy {
    rules: Vec<PolicyRule>,
    default: Requirement,
}

impl Default for Policy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default: Requirement::AnyAuthenticated,
        }
    }

    /// Override the requirement applied when no rule matches.
    pub fn with_default(mut self, requirement: Requirement) -> Self {
        self.default = requirement;
        self
    }

    /// Append one rule per pattern, in order.
    pub fn rule(mut self, method: Option<HttpMethod>, patterns: &[&str], requirement: Requirement) -> Self {
        self.rules.extend(patterns.iter().map(|p| PolicyRule {
            method,
            pattern: PathPattern::new(p),
            requirement,
        }));
        self
    }

    pub fn permit(self, method: Option<HttpMethod>, patterns: &[&str]) -> Self {
        self.rule(method, patterns, Requirement::Public)
    }

    pub fn authenticated(self, method: Option<HttpMethod>, patterns: &[&str]) -> Self {
        self.rule(method, patterns, Requirement::AnyAuthenticated)
    }

    pub fn require_role(self, method: Option<HttpMethod>, patterns: &[&str], role: Role) -> Self {
        self.rule(method, patterns, Requirement::RequiresRole(role))
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Find the requirement governing `method path`.
    pub fn decide(&self, method: &str, path: &str) -> PolicyDecision<'_> {
        match self.rules.iter().find(|r| r.matches(method, path)) {
            Some(rule) => PolicyDecision {
                rule: Some(rule),
                requirement: rule.requirement,
            },
            None => PolicyDecision {
                rule: None,
                requirement: self.default,
            },
        }
    }

    /// Decide and evaluate in one step.
    pub fn authorize(
        &self,
        method: &str,
        path: &str,
        principal: Option<&Principal>,
    ) -> Result<PolicyDecision<'_>, AuthzError> {
        let decision = self.decide(method, path);
        authorize(&decision.requirement, principal)?;
        Ok(decision)
    }
}

/// Encoded forms of `.`, `/`, `\` and `%`, compared case-insensitively.
const ENCODED_SEPARATORS: [&str; 4] = ["%2e", "%2f", "%5c", "%25"];

/// `true` when `path` is absolute and free of empty, `.` and `..` segments,
/// backslashes, semicolons and encoded separators.
/// The root `/` is canonical.
pub fn is_canonical_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    if rest.contains(['\\', ';']) {
        return false;
    }
    let lower = rest.to_ascii_lowercase();
    if ENCODED_SEPARATORS.iter().any(|e| lower.contains(*e)) {
        return false;
    }
    rest.split('/').all(|seg| !matches!(seg, "" | "." | ".."))
}
