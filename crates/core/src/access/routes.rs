//! Static route table and navigation.
//!
//! Every view declares the access it needs. [`RouteTable::navigate`] resolves
//! a concrete path against the table and runs the route guard on it.

use crate::types::{Role, Session};

use super::guard::{Decision, ENTRY_ROUTE, LOGIN_ROUTE, authorize};

/// Access requirement declared by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Renders without a session (registration and login).
    Public,
    /// Any session with a token.
    Authenticated,
    /// A session whose role is in the given set.
    Roles(&'static [Role]),
}

/// A statically declared view and the access it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    /// Path pattern; segments starting with `:` capture a parameter.
    pub path: &'static str,
    /// Access requirement.
    pub access: Access,
}

impl RouteRule {
    /// Declare a route.
    #[must_use]
    pub const fn new(path: &'static str, access: Access) -> Self {
        Self { path, access }
    }

    /// Roles the route guard should check, if any.
    #[must_use]
    pub const fn required_roles(&self) -> Option<&'static [Role]> {
        match self.access {
            Access::Roles(roles) => Some(roles),
            Access::Public | Access::Authenticated => None,
        }
    }

    /// Run the route guard for this route.
    #[must_use]
    pub fn authorize(&self, session: &Session) -> Decision {
        match self.access {
            Access::Public => Decision::Render,
            Access::Authenticated | Access::Roles(_) => {
                authorize(session, self.required_roles())
            }
        }
    }

    /// Match a normalized path, returning captured parameters.
    fn matches(&self, path: &str) -> Option<Vec<(&'static str, String)>> {
        let mut pattern = segments(self.path);
        let mut actual = segments(path);
        let mut params = Vec::new();

        loop {
            match (pattern.next(), actual.next()) {
                (None, None) => return Some(params),
                (Some(expected), Some(segment)) => {
                    if let Some(name) = expected.strip_prefix(':') {
                        params.push((name, segment.to_owned()));
                    } else if expected != segment {
                        return None;
                    }
                }
                _ => return None,
            }
        }
    }
}

/// A route resolved from a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The matching rule.
    pub rule: RouteRule,
    /// Captured `:param` segments, in pattern order.
    pub params: Vec<(&'static str, String)>,
}

impl RouteMatch {
    /// Look up a captured parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Result of navigating to a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The view renders.
    Render(RouteMatch),
    /// The guard replaced the navigation with another route.
    Redirect(&'static str),
    /// No route matches the path.
    NotFound,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const CHAT_ROLES: &[Role] = &[Role::Admin, Role::Employee, Role::Customer];

const STANDARD_ROUTES: &[RouteRule] = &[
    RouteRule::new(ENTRY_ROUTE, Access::Public),
    RouteRule::new(LOGIN_ROUTE, Access::Public),
    RouteRule::new("/home", Access::Authenticated),
    RouteRule::new("/dashboard", Access::Authenticated),
    RouteRule::new("/profile", Access::Authenticated),
    RouteRule::new("/edit-profile", Access::Authenticated),
    RouteRule::new("/create-user", Access::Roles(ADMIN_ONLY)),
    RouteRule::new("/create-agent", Access::Roles(ADMIN_ONLY)),
    RouteRule::new("/update/:agentId", Access::Roles(ADMIN_ONLY)),
    RouteRule::new("/chat/:agentId", Access::Roles(CHAT_ROLES)),
];

/// The application's route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteTable {
    /// The portal's views and their access rules.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(STANDARD_ROUTES.to_vec())
    }

    /// Build a table from explicit rules. The first matching rule wins.
    #[must_use]
    pub const fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Find the rule matching a concrete path.
    ///
    /// Query strings, fragments and a trailing slash are ignored.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch> {
        let path = normalize(path);
        self.rules.iter().find_map(|rule| {
            rule.matches(path).map(|params| RouteMatch {
                rule: *rule,
                params,
            })
        })
    }

    /// Resolve `path` and run the route guard against `session`.
    #[must_use]
    pub fn navigate(&self, session: &Session, path: &str) -> Navigation {
        let Some(route) = self.resolve(path) else {
            return Navigation::NotFound;
        };

        match route.rule.authorize(session).into_result() {
            Ok(()) => Navigation::Render(route),
            Err(denied) => Navigation::Redirect(denied.redirect_to),
        }
    }
}

/// Whether the navigation bar is shown on `path`.
///
/// Hidden on the registration and login views, and whenever the session has
/// no token.
#[must_use]
pub fn shows_navbar(session: &Session, path: &str) -> bool {
    let path = normalize(path);
    session.is_authenticated() && path != ENTRY_ROUTE && path != LOGIN_ROUTE
}

fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path.get(..end).unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { ENTRY_ROUTE } else { trimmed }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}
