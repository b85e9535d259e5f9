//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

use agent_portal_client::api::ApiError;
use agent_portal_client::{
    AuthError, ClientError, ConfigError, CreationError, RegistrationError, SessionError,
};

/// Errors reported by a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A client operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The route guard refused the view this command stands for.
    #[error("{path} is not available to this session (redirected to {target})")]
    Redirected {
        /// Route the command maps to.
        path: String,
        /// Where the guard sent the session instead.
        target: &'static str,
    },

    /// No portal route matches the path.
    #[error("no such route: {0}")]
    NotFound(String),

    /// A command-line value could not be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A generated file could not be written.
    #[error("could not write {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Route the user should go to next, if the session is gone or refused.
    pub const fn redirect_to(&self) -> Option<&'static str> {
        match self {
            Self::Client(e) => e.redirect_to(),
            Self::Redirected { target, .. } => Some(*target),
            _ => None,
        }
    }
}

macro_rules! via_client_error {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for CliError {
                fn from(e: $source) -> Self {
                    Self::Client(ClientError::from(e))
                }
            }
        )*
    };
}

via_client_error!(
    ConfigError,
    SessionError,
    AuthError,
    RegistrationError,
    CreationError,
    ApiError,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_hint() {
        let err = CliError::Redirected {
            path: "/create-agent".to_string(),
            target: "/dashboard",
        };
        assert_eq!(err.redirect_to(), Some("/dashboard"));
        assert_eq!(
            err.to_string(),
            "/create-agent is not available to this session (redirected to /dashboard)"
        );

        let err = CliError::from(ApiError::NotAuthenticated);
        assert_eq!(err.redirect_to(), Some("/"));
        assert_eq!(CliError::NotFound("/x".to_string()).redirect_to(), None);
    }
}
