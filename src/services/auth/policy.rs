//! Access policy table: an ordered list of (path pattern, method, role predicate) rules.
//!
//! Rules are evaluated in declaration order and the first match wins. When no rule
//! matches, the table's fallback applies (authenticated-only unless configured to deny).
//! The table is immutable once built and shared read-only across requests.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use axum::http::Method;
use serde::Deserialize;
use thiserror::Error;

use super::principal::{Principal, normalize_role};

/// Documentation endpoints that are always reachable without a token.
pub const DOCS_WHITELIST: &[&str] = &[
    "/v2/api-docs",
    "/swagger-resources",
    "/swagger-resources/**",
    "/configuration/ui",
    "/configuration/security",
    "/swagger-ui.html",
    "/webjars/**",
];

pub const ROLE_USERS: &str = "USERS";
pub const ROLE_MANAGERS: &str = "MANAGERS";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse policy file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },
}

/// Resolve a request path into its canonical form.
///
/// Empty and `.` segments are dropped, `..` pops the previous segment and a trailing
/// slash is ignored, so `/users/../managers/` and `/managers` classify identically.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Path matcher.
///
/// - `Exact`: canonical path equality
/// - `Glob`: `*` matches within one segment, a lone `**` matches zero or more segments
/// - `Any`: everything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Any,
    Exact(String),
    Glob(Vec<String>),
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern == "/**" || pattern == "**" {
            return Self::Any;
        }
        if pattern.contains('*') {
            return Self::Glob(
                pattern
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        Self::Exact(normalize_path(pattern))
    }

    /// Like [`PathPattern::new`], but rejects patterns that could never match a request path.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        let trimmed = pattern.trim();
        if !trimmed.starts_with('/') {
            return Err(format!("pattern must start with '/': {trimmed:?}"));
        }
        if trimmed.split('/').any(|s| s == "." || s == "..") {
            return Err(format!("pattern must not contain dot segments: {trimmed:?}"));
        }
        Ok(Self::new(trimmed))
    }

    /// `path` must already be canonical (see [`normalize_path`]).
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(p) => p == path,
            Self::Glob(parts) => {
                let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
                let pattern_parts: Vec<&str> = parts.iter().map(String::as_str).collect();
                glob_match_parts(&pattern_parts, &path_parts)
            }
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "/**"),
            Self::Exact(p) => write!(f, "{p}"),
            Self::Glob(parts) => write!(f, "/{}", parts.join("/")),
        }
    }
}

fn glob_match_parts(pattern: &[&str], path: &[&str]) -> bool {
    let Some((first, rest)) = pattern.split_first() else {
        return path.is_empty();
    };

    if *first == "**" {
        if rest.is_empty() {
            return true;
        }
        // ** consumes 0, 1, 2, ... segments
        return (0..=path.len()).any(|i| glob_match_parts(rest, &path[i..]));
    }

    match path.split_first() {
        Some((segment, path_rest)) => {
            segment_matches(first, segment) && glob_match_parts(rest, path_rest)
        }
        None => false,
    }
}

// Single-segment wildcard match: `*` spans any run of characters (never a '/').
fn segment_matches(pattern: &str, segment: &str) -> bool {
    match pattern.find('*') {
        None => pattern == segment,
        Some(star) => {
            let (prefix, tail) = (&pattern[..star], &pattern[star + 1..]);
            let Some(remaining) = segment.strip_prefix(prefix) else {
                return false;
            };
            if tail.is_empty() {
                return true;
            }
            remaining
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(remaining.len()))
                .any(|i| segment_matches(tail, &remaining[i..]))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatcher {
    Any,
    Only(Method),
}

impl MethodMatcher {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return Ok(Self::Any);
        }
        Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
            .map(Self::Only)
            .map_err(|_| format!("invalid HTTP method: {raw:?}"))
    }

    pub fn matches(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(m) => m == method,
        }
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Only(m) => write!(f, "{m}"),
        }
    }
}

/// Condition over a principal's role set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolePredicate {
    /// No token needed.
    Public,
    /// Any verified token.
    Authenticated,
    /// A verified token carrying at least one of these (normalized) roles.
    AnyOf(BTreeSet<String>),
    /// Nobody, token or not.
    DenyAll,
}

impl RolePredicate {
    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::AnyOf(
            roles
                .into_iter()
                .map(|r| normalize_role(r.as_ref()))
                .collect(),
        )
    }

    pub fn is_satisfied_by(&self, principal: &Principal) -> bool {
        match self {
            Self::Public => true,
            Self::Authenticated => !principal.is_anonymous(),
            Self::AnyOf(roles) => !principal.is_anonymous() && principal.has_any_role(roles),
            Self::DenyAll => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub method: MethodMatcher,
    pub predicate: RolePredicate,
}

impl AccessRule {
    pub fn new(pattern: PathPattern, method: MethodMatcher, predicate: RolePredicate) -> Self {
        Self {
            pattern,
            method,
            predicate,
        }
    }

    /// `path` must already be canonical.
    pub fn matches(&self, path: &str, method: &Method) -> bool {
        self.method.matches(method) && self.pattern.matches(path)
    }
}

/// What governs requests no declared rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    #[default]
    Authenticated,
    Deny,
}

impl Fallback {
    fn predicate(self) -> RolePredicate {
        match self {
            Self::Authenticated => RolePredicate::Authenticated,
            Self::Deny => RolePredicate::DenyAll,
        }
    }
}

impl FromStr for Fallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authenticated" => Ok(Self::Authenticated),
            "deny" => Ok(Self::Deny),
            other => Err(format!("unknown fallback: {other:?}")),
        }
    }
}

/// Result of classifying a request.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    pub rule: &'a AccessRule,
    /// Declaration index of the matched rule; `None` when the fallback applied.
    pub position: Option<usize>,
}

impl RuleMatch<'_> {
    pub fn is_fallback(&self) -> bool {
        self.position.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    fallback: AccessRule,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>, fallback: Fallback) -> Self {
        Self {
            rules,
            fallback: AccessRule::new(PathPattern::Any, MethodMatcher::Any, fallback.predicate()),
        }
    }

    pub fn builder() -> AccessPolicyBuilder {
        AccessPolicyBuilder::default()
    }

    /// The application's built-in table: docs and console whitelisted, open login and
    /// sign-up, user listing for USERS/MANAGERS, the managers area for MANAGERS only.
    pub fn default_table(fallback: Fallback) -> Self {
        Self::builder()
            .permit_all(DOCS_WHITELIST)
            .permit_all(&["/h2-console/**"])
            .permit(Method::POST, "/login")
            .permit(Method::POST, "/users")
            .has_any_role(Some(Method::GET), "/users", &[ROLE_USERS, ROLE_MANAGERS])
            .has_any_role(None, "/managers", &[ROLE_MANAGERS])
            .fallback(fallback)
            .build()
    }

    /// Load rules from a JSON file (see [`RuleEntry`]).
    pub fn from_file(path: &Path, fallback: Fallback) -> Result<Self, PolicyError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw, fallback)
    }

    pub fn from_json(raw: &str, fallback: Fallback) -> Result<Self, PolicyError> {
        let entries: Vec<RuleEntry> = serde_json::from_str(raw)?;
        let rules = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .into_rule()
                    .map_err(|reason| PolicyError::InvalidRule { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules, fallback))
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// Find the rule that governs `method path`: the first declared match, else the fallback.
    pub fn classify(&self, path: &str, method: &Method) -> RuleMatch<'_> {
        let path = normalize_path(path);
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(&path, method))
            .map(|(i, rule)| RuleMatch {
                rule,
                position: Some(i),
            })
            .unwrap_or(RuleMatch {
                rule: &self.fallback,
                position: None,
            })
    }
}

#[derive(Debug, Default)]
pub struct AccessPolicyBuilder {
    rules: Vec<AccessRule>,
    fallback: Fallback,
}

impl AccessPolicyBuilder {
    pub fn rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Public access on every method for each pattern.
    pub fn permit_all(mut self, patterns: &[&str]) -> Self {
        for pattern in patterns {
            self.rules.push(AccessRule::new(
                PathPattern::new(pattern),
                MethodMatcher::Any,
                RolePredicate::Public,
            ));
        }
        self
    }

    pub fn permit(self, method: Method, pattern: &str) -> Self {
        self.rule(AccessRule::new(
            PathPattern::new(pattern),
            MethodMatcher::Only(method),
            RolePredicate::Public,
        ))
    }

    pub fn authenticated(self, method: Option<Method>, pattern: &str) -> Self {
        self.rule(AccessRule::new(
            PathPattern::new(pattern),
            method.map_or(MethodMatcher::Any, MethodMatcher::Only),
            RolePredicate::Authenticated,
        ))
    }

    pub fn has_any_role(self, method: Option<Method>, pattern: &str, roles: &[&str]) -> Self {
        self.rule(AccessRule::new(
            PathPattern::new(pattern),
            method.map_or(MethodMatcher::Any, MethodMatcher::Only),
            RolePredicate::any_of(roles),
        ))
    }

    pub fn deny(self, method: Option<Method>, pattern: &str) -> Self {
        self.rule(AccessRule::new(
            PathPattern::new(pattern),
            method.map_or(MethodMatcher::Any, MethodMatcher::Only),
            RolePredicate::DenyAll,
        ))
    }

    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn build(self) -> AccessPolicy {
        AccessPolicy::new(self.rules, self.fallback)
    }
}

/// One entry of a JSON policy file.
///
/// ```json
/// [
///   { "pattern": "/docs/**", "access": "public" },
///   { "pattern": "/reports", "method": "GET", "roles": ["ANALYSTS"] },
///   { "pattern": "/internal/**", "access": "deny" }
/// ]
/// ```
///
/// `roles` implies role-restricted access; otherwise `access` must be one of
/// `public`, `authenticated` or `deny`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub pattern: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl RuleEntry {
    fn into_rule(self) -> Result<AccessRule, String> {
        let pattern = PathPattern::parse(&self.pattern)?;
        let method = match self.method.as_deref() {
            Some(m) => MethodMatcher::parse(m)?,
            None => MethodMatcher::Any,
        };

        let predicate = match (self.access.as_deref(), self.roles) {
            (Some(_), Some(_)) => return Err("'access' and 'roles' are exclusive".to_string()),
            (None, Some(roles)) => {
                let predicate = RolePredicate::any_of(roles.iter().filter(|r| !r.trim().is_empty()));
                if matches!(&predicate, RolePredicate::AnyOf(set) if set.is_empty()) {
                    return Err("'roles' must name at least one role".to_string());
                }
                predicate
            }
            (Some(access), None) => match access.trim().to_ascii_lowercase().as_str() {
                "public" | "permit_all" => RolePredicate::Public,
                "authenticated" => RolePredicate::Authenticated,
                "deny" | "deny_all" => RolePredicate::DenyAll,
                other => return Err(format!("unknown access: {other:?}")),
            },
            (None, None) => return Err("one of 'access' or 'roles' is required".to_string()),
        };

        Ok(AccessRule::new(pattern, method, predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_segments() {
        assert_eq!(normalize_path("/users/../managers/"), "/managers");
        assert_eq!(normalize_path("//managers"), "/managers");
        assert_eq!(normalize_path("/./users"), "/users");
        assert_eq!(normalize_path("/../.."), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn exact_pattern() {
        let p = PathPattern::new("/users");
        assert!(p.matches("/users"));
        assert!(!p.matches("/users/1"));
        assert!(!p.matches("/user"));
    }

    #[test]
    fn double_star_matches_base_and_descendants() {
        let p = PathPattern::new("/swagger-resources/**");
        assert!(p.matches("/swagger-resources"));
        assert!(p.matches("/swagger-resources/configuration/ui"));
        assert!(!p.matches("/swagger-resourcesX"));
        assert!(!p.matches("/other"));
    }

    #[test]
    fn single_star_spans_one_segment() {
        let p = PathPattern::new("/api/*/users");
        assert!(p.matches("/api/v1/users"));
        assert!(!p.matches("/api/v1/v2/users"));

        let p = PathPattern::new("/static/*.js");
        assert!(p.matches("/static/app.js"));
        assert!(!p.matches("/static/app.css"));
    }

    #[test]
    fn parse_rejects_relative_and_dot_patterns() {
        assert!(PathPattern::parse("users").is_err());
        assert!(PathPattern::parse("/a/../b").is_err());
        assert_eq!(PathPattern::parse("/**").unwrap(), PathPattern::Any);
    }

    #[test]
    fn default_table_classifies_known_routes() {
        let policy = AccessPolicy::default_table(Fallback::Authenticated);

        let m = policy.classify("/webjars/springfox/app.js", &Method::GET);
        assert_eq!(m.rule.predicate, RolePredicate::Public);

        let m = policy.classify("/h2-console", &Method::POST);
        assert_eq!(m.rule.predicate, RolePredicate::Public);

        let m = policy.classify("/users", &Method::POST);
        assert_eq!(m.rule.predicate, RolePredicate::Public);

        let m = policy.classify("/users", &Method::GET);
        assert_eq!(
            m.rule.predicate,
            RolePredicate::any_of([ROLE_USERS, ROLE_MANAGERS])
        );

        let m = policy.classify("/managers", &Method::DELETE);
        assert_eq!(m.rule.predicate, RolePredicate::any_of([ROLE_MANAGERS]));

        let m = policy.classify("/login", &Method::GET);
        assert!(m.is_fallback());
        assert_eq!(m.rule.predicate, RolePredicate::Authenticated);
    }

    #[test]
    fn first_declared_match_wins() {
        let policy = AccessPolicy::builder()
            .has_any_role(None, "/reports/secret", &[ROLE_MANAGERS])
            .permit_all(&["/reports/**"])
            .build();

        let m = policy.classify("/reports/secret", &Method::GET);
        assert_eq!(m.position, Some(0));
        assert_eq!(m.rule.predicate, RolePredicate::any_of([ROLE_MANAGERS]));

        let m = policy.classify("/reports/public", &Method::GET);
        assert_eq!(m.position, Some(1));
    }

    #[test]
    fn dot_segments_cannot_dodge_a_rule() {
        let policy = AccessPolicy::default_table(Fallback::Authenticated);
        let m = policy.classify("/webjars/../managers", &Method::GET);
        assert_eq!(m.rule.predicate, RolePredicate::any_of([ROLE_MANAGERS]));
    }

    #[test]
    fn deny_fallback() {
        let policy = AccessPolicy::builder().fallback(Fallback::Deny).build();
        let m = policy.classify("/anything", &Method::GET);
        assert!(m.is_fallback());
        assert_eq!(m.rule.predicate, RolePredicate::DenyAll);
    }

    #[test]
    fn loads_rules_from_json() {
        let raw = r#"[
            { "pattern": "/docs/**", "access": "public" },
            { "pattern": "/reports", "method": "get", "roles": ["ROLE_ANALYSTS"] },
            { "pattern": "/internal/**", "access": "deny" }
        ]"#;
        let policy = AccessPolicy::from_json(raw, Fallback::Authenticated).unwrap();
        assert_eq!(policy.rules().len(), 3);

        let m = policy.classify("/reports", &Method::GET);
        assert_eq!(m.rule.predicate, RolePredicate::any_of(["ANALYSTS"]));

        let m = policy.classify("/reports", &Method::POST);
        assert!(m.is_fallback());
    }

    #[test]
    fn authenticated_rule_shadows_later_permit() {
        let policy = AccessPolicy::builder()
            .authenticated(Some(Method::POST), "/reports/**")
            .permit_all(&["/reports/**"])
            .fallback(Fallback::Deny)
            .build();

        let m = policy.classify("/reports/2024", &Method::POST);
        assert_eq!(m.position, Some(0));
        assert_eq!(m.rule.predicate, RolePredicate::Authenticated);

        let m = policy.classify("/reports/2024", &Method::GET);
        assert_eq!(m.position, Some(1));
        assert_eq!(m.rule.predicate, RolePredicate::Public);
    }

    #[test]
    fn missing_policy_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AccessPolicy::from_file(&dir.path().join("absent.json"), Fallback::Authenticated)
            .unwrap_err();
        assert!(matches!(err, PolicyError::Io(_)), "{err:?}");
    }

    #[test]
    fn json_rule_errors_carry_the_index() {
        let raw = r#"[
            { "pattern": "/ok", "access": "public" },
            { "pattern": "/bad", "access": "sometimes" }
        ]"#;
        match AccessPolicy::from_json(raw, Fallback::Authenticated) {
            Err(PolicyError::InvalidRule { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected: {other:?}"),
        }

        let raw = r#"[{ "pattern": "/x", "access": "public", "roles": ["A"] }]"#;
        assert!(AccessPolicy::from_json(raw, Fallback::Authenticated).is_err());

        let raw = r#"[{ "pattern": "/x", "roles": [] }]"#;
        assert!(AccessPolicy::from_json(raw, Fallback::Authenticated).is_err());
    }

    #[test]
    fn predicates() {
        let alice = Principal::authenticated("alice", ["USERS"]);
        let anon = Principal::anonymous();

        assert!(RolePredicate::Public.is_satisfied_by(&anon));
        assert!(!RolePredicate::Authenticated.is_satisfied_by(&anon));
        assert!(RolePredicate::Authenticated.is_satisfied_by(&alice));
        assert!(RolePredicate::any_of(["USERS", "MANAGERS"]).is_satisfied_by(&alice));
        assert!(!RolePredicate::any_of(["MANAGERS"]).is_satisfied_by(&alice));
        assert!(!RolePredicate::DenyAll.is_satisfied_by(&alice));
    }
}
