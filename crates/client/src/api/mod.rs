//! Authenticated API client.
//!
//! Every call attaches the session token as a bearer credential. A 401 or 403
//! from any endpoint means the token is no longer valid: the session is
//! cleared and the caller is told to navigate to the entry route.
//!
//! Operations are grouped by resource:
//! - [`agents`] - agent CRUD, tool list, chat reset
//! - [`users`] - user list and profile
//! - [`chat`] - conversations with an agent
//! - [`letters`] - letter generation and outgoing email

mod agents;
mod chat;
mod error;
mod letters;
mod types;
mod users;

use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use agent_portal_core::{AccessToken, ENTRY_ROUTE};

use crate::session::SessionStore;
use crate::transport::{Transport, error_detail};

pub use error::ApiError;
pub use types::{
    Agent, AgentSaved, AgentUpdate, ChatMessage, ChatReply, ChatRole, LIVE_AGENT_PROMPT, Letter,
    NewAgent, Profile, ProfileUpdate, UserSummary,
};

/// Client for the authenticated endpoints.
pub struct ApiClient<'a> {
    transport: &'a Transport,
    session: &'a SessionStore,
}

impl<'a> ApiClient<'a> {
    /// Create a client that authenticates with `session`.
    #[must_use]
    pub const fn new(transport: &'a Transport, session: &'a SessionStore) -> Self {
        Self { transport, session }
    }

    /// Start an authenticated request.
    ///
    /// Fails with `NotAuthenticated` when there is no token, before anything
    /// is sent.
    fn request(&self, method: Method, path: &str) -> Result<Authorized, ApiError> {
        let token = self.session.token().ok_or(ApiError::NotAuthenticated)?;
        let builder = self
            .transport
            .request(method, path)
            .bearer_auth(token.expose());
        Ok(Authorized { builder, token })
    }

    /// Send a request and apply the status policy.
    ///
    /// A 401 or 403 clears the session only if it still holds the token the
    /// request was sent with.
    async fn execute(&self, request: Authorized) -> Result<Response, ApiError> {
        let Authorized { builder, token } = request;
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "API rejected session token; clearing session");
            self.session.invalidate_if(&token);
            return Err(ApiError::SessionRejected {
                status,
                redirect_to: ENTRY_ROUTE,
            });
        }

        let message = error_detail(response).await;
        warn!(%status, %message, "API request failed");
        Err(ApiError::Status { status, message })
    }

    /// Send a request and decode a JSON body.
    async fn fetch<T: DeserializeOwned>(&self, request: Authorized) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// A request carrying the bearer token it will be sent with.
struct Authorized {
    builder: RequestBuilder,
    token: AccessToken,
}

impl Authorized {
    fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        Self {
            builder: self.builder.json(body),
            token: self.token,
        }
    }

    fn multipart(self, form: Form) -> Self {
        Self {
            builder: self.builder.multipart(form),
            token: self.token,
        }
    }
}

/// Percent-encode a caller-supplied path segment.
fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}
