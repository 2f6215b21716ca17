//! Static table of paths that bypass authentication.
//!
//! Rules are evaluated in order and the first match decides. Anything that no
//! rule matches requires authentication.

/// Redfish version document.
pub const VERSIONS_PATH: &str = "/redfish";
/// Service root.
pub const SERVICE_ROOT_PATH: &str = "/redfish/v1/";
/// Session collection; POST here is the login endpoint.
pub const SESSIONS_PATH: &str = "/redfish/v1/SessionService/Sessions";
/// Server-sent event subscription stream.
pub const EVENT_STREAM_PATH: &str = "/redfish/v1/EventService/SSE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    /// Matches the prefix itself and everything below it.
    Subtree(String),
}

impl PathPattern {
    /// Parse `"/a/b"` as an exact path and `"/a/b/**"` as a subtree.
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(prefix) => PathPattern::Subtree(prefix.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Subtree(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub requires_auth: bool,
}

impl AccessRule {
    pub fn exempt(pattern: &str) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            requires_auth: false,
        }
    }

    pub fn protected(pattern: &str) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            requires_auth: true,
        }
    }
}

/// Immutable, ordered rule set. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// The Redfish allow-list: version document, service root, login and
    /// event stream.
    pub fn redfish_default() -> Self {
        Self::new(vec![
            AccessRule::exempt(VERSIONS_PATH),
            AccessRule::exempt("/redfish/"),
            AccessRule::exempt("/redfish/v1"),
            AccessRule::exempt(SERVICE_ROOT_PATH),
            AccessRule::exempt(SESSIONS_PATH),
            AccessRule::exempt(EVENT_STREAM_PATH),
        ])
    }

    /// First matching rule, if any.
    pub fn rule_for(&self, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|rule| rule.pattern.matches(path))
    }

    /// Deny by default: only an explicit exempt rule lifts the requirement.
    pub fn requires_auth(&self, path: &str) -> bool {
        self.rule_for(path).is_none_or(|rule| rule.requires_auth)
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }
}
