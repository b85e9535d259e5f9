//! Top-level client handle.

use tracing::debug;

use agent_portal_core::{Capabilities, Navigation, RouteTable, Session, shows_navbar};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::gateway::AuthGateway;
use crate::session::{FileBackend, SessionStore};
use crate::transport::Transport;

/// Agent Portal client.
///
/// Owns the HTTP transport, the session store and the route table, and hands
/// out borrowed views for each concern.
///
/// # Example
///
/// ```no_run
/// use agent_portal_client::{ClientConfig, PortalClient};
/// use secrecy::SecretString;
///
/// # async fn example() -> Result<(), agent_portal_client::ClientError> {
/// let client = PortalClient::new(ClientConfig::from_env()?)?;
/// client
///     .auth()
///     .login("alice", &SecretString::from("hunter2".to_string()))
///     .await?;
/// for agent in client.api().list_agents().await? {
///     println!("{}", agent.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PortalClient {
    transport: Transport,
    session: SessionStore,
    routes: RouteTable,
}

impl PortalClient {
    /// Create a client whose session is persisted to `config.session_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the session
    /// file exists but cannot be read.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let session = SessionStore::open(FileBackend::new(&config.session_file))?;
        Self::with_session(config, session)
    }

    /// Create a client over an existing session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_session(config: ClientConfig, session: SessionStore) -> Result<Self, ClientError> {
        debug!(api_url = %config.api_url, "Creating portal client");
        Ok(Self {
            transport: Transport::new(config)?,
            session,
            routes: RouteTable::standard(),
        })
    }

    /// Configuration the client was built from.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    /// The session store.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Login, registration, user creation and logout.
    #[must_use]
    pub const fn auth(&self) -> AuthGateway<'_> {
        AuthGateway::new(&self.transport, &self.session)
    }

    /// Authenticated API calls.
    #[must_use]
    pub const fn api(&self) -> ApiClient<'_> {
        ApiClient::new(&self.transport, &self.session)
    }

    /// The route table.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Resolve `path` and run the route guard against the current session.
    #[must_use]
    pub fn navigate(&self, path: &str) -> Navigation {
        self.routes.navigate(&self.session.get_session(), path)
    }

    /// What the current session's role may do.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_role(self.session.get_session().role)
    }

    /// Whether the navigation bar is shown on `path`.
    #[must_use]
    pub fn shows_navbar(&self, path: &str) -> bool {
        shows_navbar(&self.session.get_session(), path)
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn current_session(&self) -> Session {
        self.session.get_session()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agent_portal_core::{AccessToken, Role, UserId};

    use super::*;

    fn client() -> PortalClient {
        let config = ClientConfig::new("http://127.0.0.1:9", "/unused").unwrap();
        PortalClient::with_session(config, SessionStore::in_memory()).unwrap()
    }

    #[test]
    fn test_navigation_follows_session() {
        let client = client();
        assert_eq!(client.navigate("/create-agent"), Navigation::Redirect("/"));
        assert!(!client.shows_navbar("/home"));
        assert!(!client.capabilities().chat);

        client
            .session()
            .set_session(AccessToken::new("t1"), Role::Employee, UserId::new("u1"), "bob")
            .unwrap();
        assert_eq!(
            client.navigate("/create-agent"),
            Navigation::Redirect("/dashboard")
        );
        assert!(matches!(client.navigate("/chat/a1"), Navigation::Render(_)));
        assert!(client.shows_navbar("/home"));
        assert!(client.capabilities().chat);
        assert!(!client.capabilities().manage_agents);
    }

    #[tokio::test]
    async fn test_api_without_token_sends_nothing() {
        let client = client();
        let err = client.api().list_agents().await.unwrap_err();
        assert!(matches!(err, crate::api::ApiError::NotAuthenticated));
    }
}
