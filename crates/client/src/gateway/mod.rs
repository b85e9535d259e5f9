//! Auth gateway.
//!
//! The three calls that create or open an account, plus logout. Each is a
//! single request with no retry. Only `login` writes the session store.

mod error;

use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use agent_portal_core::{AccessToken, Email, LOGIN_ROUTE, Role, Session, UserId};

use crate::session::{SessionError, SessionStore};
use crate::transport::{Transport, error_detail};

pub use error::{AuthError, CreationError, RegistrationError};

/// `POST /login` response body.
#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    role: String,
    user_id: String,
}

/// `POST /register` and `POST /create-user` response body.
#[derive(Deserialize)]
struct CreatedResponse {
    user_id: String,
}

/// An account created by an admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Server-assigned ID.
    pub user_id: UserId,
    /// Login name.
    pub username: String,
    /// Role the account was created with.
    pub role: Role,
}

/// Account operations against the remote API.
pub struct AuthGateway<'a> {
    transport: &'a Transport,
    session: &'a SessionStore,
}

impl<'a> AuthGateway<'a> {
    /// Create a gateway over a transport and the session store it writes.
    #[must_use]
    pub const fn new(transport: &'a Transport, session: &'a SessionStore) -> Self {
        Self { transport, session }
    }

    /// Exchange credentials for a session.
    ///
    /// On success the session store holds the new token, role, user ID and
    /// username. On any failure the store is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - `AuthError::Rejected` for any non-2xx response
    /// - `AuthError::Unreachable` if the request could not be sent
    /// - `AuthError::InvalidResponse` if the body or role is unusable
    /// - `AuthError::Session` if the session cannot be persisted
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        let response = self
            .transport
            .request(Method::POST, "/login")
            .form(&[
                ("username", username),
                ("password", password.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_detail(response).await;
            warn!(%status, "Login rejected");
            return Err(AuthError::Rejected { status, message });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        if body.access_token.is_empty() {
            return Err(AuthError::InvalidResponse("empty access token".to_string()));
        }
        if let Some(kind) = &body.token_type
            && !kind.eq_ignore_ascii_case("bearer")
        {
            return Err(AuthError::InvalidResponse(format!(
                "unsupported token type '{kind}'"
            )));
        }
        let role: Role = body
            .role
            .parse()
            .map_err(|e: agent_portal_core::RoleParseError| {
                AuthError::InvalidResponse(e.to_string())
            })?;

        let session = self.session.set_session(
            AccessToken::new(body.access_token),
            role,
            UserId::new(body.user_id),
            username,
        )?;

        info!(role = %role, "Logged in");
        Ok(session)
    }

    /// Self-register a customer account.
    ///
    /// Does not log in; the caller navigates to the login view afterwards.
    ///
    /// # Errors
    ///
    /// - `RegistrationError::MissingField` / `InvalidEmail` before any request
    /// - `RegistrationError::Rejected` for any non-2xx response
    /// - `RegistrationError::Unreachable` if the request could not be sent
    #[instrument(skip(self, password, email), fields(username = %username))]
    pub async fn register_customer(
        &self,
        username: &str,
        password: &SecretString,
        email: &str,
    ) -> Result<(), RegistrationError> {
        require(username, "username").map_err(RegistrationError::MissingField)?;
        require(password.expose_secret(), "password").map_err(RegistrationError::MissingField)?;
        let email = Email::parse(email)?;

        let form = Form::new()
            .text("username", username.to_string())
            .text("password", password.expose_secret().to_string())
            .text("email", email.into_inner())
            .text("role", Role::Customer.as_str());

        let response = self
            .transport
            .request(Method::POST, "/register")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_detail(response).await;
            warn!(%status, %message, "Registration rejected");
            return Err(RegistrationError::Rejected { status, message });
        }

        info!("Customer registered");
        Ok(())
    }

    /// Create an employee or customer account as the logged-in admin.
    ///
    /// Admin privilege is enforced by the API; the client only checks that a
    /// token is present. A 401 or 403 clears the session.
    ///
    /// # Errors
    ///
    /// - `CreationError::MissingField` / `RoleNotAssignable` /
    ///   `NotAuthenticated` before any request
    /// - `CreationError::SessionRejected` on 401 or 403
    /// - `CreationError::Rejected` for any other non-2xx response
    /// - `CreationError::Unreachable` if the request could not be sent
    #[instrument(skip(self, password), fields(username = %username, role = %role))]
    pub async fn create_user(
        &self,
        username: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<UserRecord, CreationError> {
        require(username, "username").map_err(CreationError::MissingField)?;
        require(password.expose_secret(), "password").map_err(CreationError::MissingField)?;
        if !role.is_assignable() {
            return Err(CreationError::RoleNotAssignable(role));
        }
        let token = self.session.token().ok_or(CreationError::NotAuthenticated)?;

        let form = Form::new()
            .text("username", username.to_string())
            .text("password", password.expose_secret().to_string())
            .text("role", role.as_str());

        let response = self
            .transport
            .request(Method::POST, "/create-user")
            .bearer_auth(token.expose())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "Session rejected while creating user");
            self.session.invalidate_if(&token);
            return Err(CreationError::SessionRejected { status });
        }
        if !status.is_success() {
            let message = error_detail(response).await;
            warn!(%status, %message, "User creation rejected");
            return Err(CreationError::Rejected { status, message });
        }

        let body: CreatedResponse = response
            .json()
            .await
            .map_err(|e| CreationError::InvalidResponse(e.to_string()))?;

        info!(user_id = %body.user_id, "User created");
        Ok(UserRecord {
            user_id: UserId::new(body.user_id),
            username: username.to_string(),
            role,
        })
    }

    /// End the session.
    ///
    /// Returns the route to navigate to.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted storage cannot be cleared. The in-memory
    /// session is cleared regardless.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<&'static str, SessionError> {
        self.session.clear_session()?;
        info!("Logged out");
        Ok(LOGIN_ROUTE)
    }
}

fn require(value: &str, field: &'static str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err(field)
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    // Port 9 (discard) is never served; any request that escapes local
    // validation fails as `Unreachable`.
    fn transport() -> Transport {
        Transport::new(ClientConfig::new("http://127.0.0.1:9", "/unused").unwrap()).unwrap()
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email_locally() {
        let transport = transport();
        let session = SessionStore::in_memory();
        let gateway = AuthGateway::new(&transport, &session);

        let err = gateway
            .register_customer("carol", &secret("pw"), "carol@localhost")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidEmail(_)));

        let err = gateway
            .register_customer("  ", &secret("pw"), "carol@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MissingField("username")));
    }

    #[tokio::test]
    async fn test_create_user_requires_token_and_assignable_role() {
        let transport = transport();
        let session = SessionStore::in_memory();
        let gateway = AuthGateway::new(&transport, &session);

        let err = gateway
            .create_user("dave", &secret("pw"), Role::Employee)
            .await
            .unwrap_err();
        assert!(matches!(err, CreationError::NotAuthenticated));
        assert_eq!(err.redirect_to(), Some("/"));

        session
            .set_session(AccessToken::new("t1"), Role::Admin, UserId::new("u1"), "ann")
            .unwrap();
        let err = gateway
            .create_user("dave", &secret("pw"), Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, CreationError::RoleNotAssignable(Role::Admin)));
    }

    #[tokio::test]
    async fn test_unreachable_login_leaves_session_untouched() {
        let transport = transport();
        let session = SessionStore::in_memory();
        session
            .set_session(AccessToken::new("t1"), Role::Customer, UserId::new("u1"), "carol")
            .unwrap();
        let before = session.get_session();

        let err = AuthGateway::new(&transport, &session)
            .login("alice", &secret("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unreachable(_)));
        assert_eq!(session.get_session(), before);
    }

    #[test]
    fn test_logout_clears_and_returns_login_route() {
        let transport = transport();
        let session = SessionStore::in_memory();
        session
            .set_session(AccessToken::new("t1"), Role::Admin, UserId::new("u1"), "ann")
            .unwrap();

        let route = AuthGateway::new(&transport, &session).logout().unwrap();
        assert_eq!(route, "/login");
        assert!(session.get_session().is_empty());
    }
}
