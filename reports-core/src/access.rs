//! Caller identity and item-level access control.

use std::collections::BTreeSet;

/// Security role that grants unfiltered access.
pub const ADMIN_ROLE: &str = "all_access";

const USER_TAG: &str = "User:";
const BACKEND_ROLE_TAG: &str = "BERole:";

/// Authenticated caller as reported by the security layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub backend_roles: Vec<String>,
    pub roles: Vec<String>,
    pub tenant: Option<String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend_roles: Vec::new(),
            roles: Vec::new(),
            tenant: None,
        }
    }

    pub fn with_backend_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backend_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a user-info string of the form
    /// `name|backend_role1,backend_role2|role1,role2|tenant`.
    ///
    /// Trailing sections may be omitted. Returns `None` when the name is
    /// empty or there are more than four sections.
    pub fn from_user_info(value: &str) -> Option<Self> {
        let mut sections = value.split('|');
        let name = sections.next()?.trim();
        if name.is_empty() {
            return None;
        }
        let backend_roles = split_list(sections.next());
        let roles = split_list(sections.next());
        let tenant = sections
            .next()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        if sections.next().is_some() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            backend_roles,
            roles,
            tenant,
        })
    }
}

fn split_list(section: Option<&str>) -> Vec<String> {
    section
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Access scope of one request, resolved once from the principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    /// `None` for trusted internal callers.
    pub user: Option<String>,
    pub backend_roles: BTreeSet<String>,
    pub roles: BTreeSet<String>,
}

impl AccessContext {
    /// Context for internal callers; sees everything.
    pub fn internal() -> Self {
        Self::default()
    }

    pub fn resolve(principal: Option<&Principal>) -> Self {
        match principal {
            None => Self::internal(),
            Some(principal) => Self {
                user: Some(principal.name.clone()),
                backend_roles: principal.backend_roles.iter().cloned().collect(),
                roles: principal.roles.iter().cloned().collect(),
            },
        }
    }

    pub fn is_internal(&self) -> bool {
        self.user.is_none()
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }

    /// Entries this identity owns, e.g. `["User:alice", "BERole:analyst"]`.
    /// Empty for internal callers.
    pub fn access_entries(&self) -> Vec<String> {
        let Some(user) = &self.user else {
            return Vec::new();
        };
        std::iter::once(format!("{USER_TAG}{user}"))
            .chain(
                self.backend_roles
                    .iter()
                    .map(|role| format!("{BACKEND_ROLE_TAG}{role}")),
            )
            .collect()
    }

    /// Access entries to filter searches by, or `None` for no filtering.
    pub fn search_filter(&self) -> Option<Vec<String>> {
        if self.is_internal() || self.is_admin() {
            None
        } else {
            Some(self.access_entries())
        }
    }

    pub fn can_access(&self, item_access: &[String]) -> bool {
        match self.search_filter() {
            None => true,
            Some(entries) => item_access.iter().any(|entry| entries.contains(entry)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_internal_sees_everything() {
        let ctx = AccessContext::resolve(None);
        assert!(ctx.is_internal());
        assert_eq!(ctx.search_filter(), None);
        assert!(ctx.can_access(&[]));
    }

    #[test]
    fn test_user_and_backend_role_entries() {
        let principal = Principal::new("alice").with_backend_roles(["analyst"]);
        let ctx = AccessContext::resolve(Some(&principal));
        assert_eq!(
            ctx.search_filter(),
            Some(entries(&["User:alice", "BERole:analyst"]))
        );
        assert!(ctx.can_access(&entries(&["BERole:analyst"])));
        assert!(ctx.can_access(&entries(&["User:alice"])));
        assert!(!ctx.can_access(&entries(&["User:bob"])));
        assert!(!ctx.can_access(&[]));
    }

    #[test]
    fn test_admin_role_is_unfiltered() {
        let principal = Principal::new("root").with_roles([ADMIN_ROLE]);
        let ctx = AccessContext::resolve(Some(&principal));
        assert!(!ctx.is_internal());
        assert_eq!(ctx.search_filter(), None);
        assert!(ctx.can_access(&entries(&["User:bob"])));
    }

    #[test]
    fn test_user_info_parsing() {
        let principal = Principal::from_user_info("alice|analyst, ops|reports_read|global");
        assert_eq!(
            principal,
            Some(Principal {
                name: "alice".to_string(),
                backend_roles: entries(&["analyst", "ops"]),
                roles: entries(&["reports_read"]),
                tenant: Some("global".to_string()),
            })
        );
        assert_eq!(
            Principal::from_user_info("bob"),
            Some(Principal::new("bob"))
        );
        assert_eq!(Principal::from_user_info(""), None);
        assert_eq!(Principal::from_user_info("|analyst"), None);
        assert_eq!(Principal::from_user_info("a|b|c|d|e"), None);
    }
}
