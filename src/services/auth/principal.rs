//! Authenticated identity attached to a single request.

use std::collections::BTreeSet;

const ROLE_PREFIX: &str = "ROLE_";

/// Normalize a role name: `ROLE_MANAGERS` and `MANAGERS` are the same role.
pub fn normalize_role(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(ROLE_PREFIX)
        .unwrap_or(trimmed)
        .to_string()
}

/// Identity resolved for one request.
///
/// - `subject` is `None` for requests admitted by a public rule
/// - `roles` are normalized (see [`normalize_role`])
/// - never persisted; lives in request extensions until the response is produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: Option<String>,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            subject: None,
            roles: BTreeSet::new(),
        }
    }

    pub fn authenticated<I, S>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            subject: Some(subject.into()),
            roles: roles
                .into_iter()
                .map(|r| normalize_role(r.as_ref()))
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.subject.is_none()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(&normalize_role(role))
    }

    pub fn has_any_role<'a, I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        roles.into_iter().any(|r| self.roles.contains(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_spring_style_prefix() {
        assert_eq!(normalize_role("ROLE_MANAGERS"), "MANAGERS");
        assert_eq!(normalize_role(" USERS "), "USERS");
    }

    #[test]
    fn authenticated_principal_normalizes_roles() {
        let p = Principal::authenticated("alice", ["ROLE_USERS", "USERS", ""]);
        assert_eq!(p.subject.as_deref(), Some("alice"));
        assert_eq!(p.roles.len(), 1);
        assert!(p.has_role("USERS"));
        assert!(p.has_role("ROLE_USERS"));
        assert!(!p.has_role("users"));
    }

    #[test]
    fn anonymous_has_nothing() {
        let p = Principal::anonymous();
        assert!(p.is_anonymous());
        assert!(p.roles.is_empty());
    }
}
