//! The route guard decision function.

use crate::types::{Role, Session};

/// Entry route. Unauthenticated navigation lands here (registration view).
pub const ENTRY_ROUTE: &str = "/";

/// Login view.
pub const LOGIN_ROUTE: &str = "/login";

/// Landing view after a successful login.
pub const HOME_ROUTE: &str = "/home";

/// Fallback for authenticated users who lack the role a view requires.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Outcome of authorizing a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The target view may render.
    Render,
    /// Navigation must be replaced by the given route.
    RedirectTo(&'static str),
}

impl Decision {
    /// Convert into a `Result`, for callers that treat a redirect as a stop.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationDenied`] carrying the redirect target.
    pub const fn into_result(self) -> Result<(), AuthorizationDenied> {
        match self {
            Self::Render => Ok(()),
            Self::RedirectTo(redirect_to) => Err(AuthorizationDenied { redirect_to }),
        }
    }
}

/// A navigation refused by the route guard.
///
/// This is never shown to the user as an error; callers follow the redirect.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("navigation redirected to {redirect_to}")]
pub struct AuthorizationDenied {
    /// Route to navigate to instead.
    pub redirect_to: &'static str,
}

/// Decide whether a view guarded by `required_roles` may render.
///
/// - No token: redirect to [`ENTRY_ROUTE`].
/// - Token present, `required_roles` given and the session role is not in it
///   (including an absent role): redirect to [`DASHBOARD_ROUTE`].
/// - Otherwise: [`Decision::Render`].
///
/// ```
/// use agent_portal_core::{AccessToken, Decision, Role, Session, UserId, authorize};
///
/// let session = Session::authenticated(
///     AccessToken::new("t1"),
///     Role::Employee,
///     UserId::new("u1"),
///     "bob",
/// );
/// assert_eq!(
///     authorize(&session, Some([Role::Admin].as_slice())),
///     Decision::RedirectTo("/dashboard"),
/// );
/// assert_eq!(authorize(&session, None), Decision::Render);
/// ```
#[must_use]
pub fn authorize(session: &Session, required_roles: Option<&[Role]>) -> Decision {
    if !session.is_authenticated() {
        return Decision::RedirectTo(ENTRY_ROUTE);
    }

    if let Some(roles) = required_roles {
        let is_member = session.role.is_some_and(|role| roles.contains(&role));
        if !is_member {
            return Decision::RedirectTo(DASHBOARD_ROUTE);
        }
    }

    Decision::Render
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessToken, UserId};

    fn session_with(role: Option<Role>) -> Session {
        Session {
            token: Some(AccessToken::new("t1")),
            role,
            user_id: Some(UserId::new("u1")),
            username: Some("alice".to_string()),
        }
    }

    fn role_sets() -> Vec<Option<Vec<Role>>> {
        vec![
            None,
            Some(vec![]),
            Some(vec![Role::Admin]),
            Some(vec![Role::Employee, Role::Customer]),
            Some(Role::ALL.to_vec()),
        ]
    }

    #[test]
    fn test_absent_token_always_redirects_to_entry() {
        let mut sessions = vec![Session::anonymous()];
        for role in Role::ALL {
            sessions.push(Session {
                token: None,
                role: Some(role),
                user_id: Some(UserId::new("u1")),
                username: None,
            });
        }

        for session in &sessions {
            for roles in role_sets() {
                assert_eq!(
                    authorize(session, roles.as_deref()),
                    Decision::RedirectTo(ENTRY_ROUTE)
                );
            }
        }
    }

    #[test]
    fn test_token_without_required_roles_renders() {
        for role in [None, Some(Role::Admin), Some(Role::Employee), Some(Role::Customer)] {
            assert_eq!(authorize(&session_with(role), None), Decision::Render);
        }
    }

    #[test]
    fn test_role_mismatch_redirects_to_dashboard_never_entry() {
        for role in Role::ALL {
            let session = session_with(Some(role));
            for roles in role_sets().into_iter().flatten() {
                let decision = authorize(&session, Some(roles.as_slice()));
                if roles.contains(&role) {
                    assert_eq!(decision, Decision::Render);
                } else {
                    assert_eq!(decision, Decision::RedirectTo(DASHBOARD_ROUTE));
                }
            }
        }
    }

    #[test]
    fn test_employee_on_admin_route_goes_to_dashboard() {
        let session = session_with(Some(Role::Employee));
        assert_eq!(
            authorize(&session, Some([Role::Admin].as_slice())),
            Decision::RedirectTo("/dashboard")
        );
    }

    #[test]
    fn test_missing_token_on_open_route_goes_to_entry() {
        assert_eq!(
            authorize(&Session::anonymous(), None),
            Decision::RedirectTo("/")
        );
    }

    #[test]
    fn test_unknown_role_is_member_of_nothing() {
        let session = session_with(None);
        assert_eq!(
            authorize(&session, Some(Role::ALL.as_slice())),
            Decision::RedirectTo(DASHBOARD_ROUTE)
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Decision::Render.into_result(), Ok(()));
        let denied = Decision::RedirectTo(DASHBOARD_ROUTE).into_result();
        assert_eq!(
            denied,
            Err(AuthorizationDenied {
                redirect_to: DASHBOARD_ROUTE
            })
        );
    }
}
