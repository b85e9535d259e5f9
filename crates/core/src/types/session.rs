//! Client-held session snapshot.

use super::{AccessToken, Role, UserId};

/// The client-held proof of authentication for the current user.
///
/// All four fields are written together by a successful login and cleared
/// together by logout. A session restored from corrupted storage may carry
/// a token without a role; the route guard treats such a session as
/// authenticated but a member of no role set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Bearer token attached to authenticated requests.
    pub token: Option<AccessToken>,
    /// Role reported by the API at login.
    pub role: Option<Role>,
    /// Server-side user ID.
    pub user_id: Option<UserId>,
    /// Username the session was opened with.
    pub username: Option<String>,
}

impl Session {
    /// A session with every field present.
    #[must_use]
    pub fn authenticated(
        token: AccessToken,
        role: Role,
        user_id: UserId,
        username: impl Into<String>,
    ) -> Self {
        Self {
            token: Some(token),
            role: Some(role),
            user_id: Some(user_id),
            username: Some(username.into()),
        }
    }

    /// A session with every field absent.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Whether a bearer token is present.
    ///
    /// This is the only check used for "logged in"; the token is trusted until
    /// the API rejects it.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether every field is absent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.token.is_none()
            && self.role.is_none()
            && self.user_id.is_none()
            && self.username.is_none()
    }

    /// Whether the session's role is `Admin`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session_is_empty() {
        let session = Session::anonymous();
        assert!(session.is_empty());
        assert!(!session.is_authenticated());
        assert!(!session.is_admin());
    }

    #[test]
    fn test_authenticated_session_sets_all_fields() {
        let session = Session::authenticated(
            AccessToken::new("t1"),
            Role::Admin,
            UserId::new("u1"),
            "alice",
        );
        assert!(session.is_authenticated());
        assert!(session.is_admin());
        assert!(!session.is_empty());
        assert_eq!(session.username.as_deref(), Some("alice"));
    }
}
