//! Unified error handling for the client.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::gateway::{AuthError, CreationError, RegistrationError};
use crate::session::SessionError;

/// Any error the client can produce.
///
/// Operations return their own narrower error; this type lets front ends
/// handle them uniformly with `?`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Session persistence failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Login failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Registration failed.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// User creation failed.
    #[error(transparent)]
    Creation(#[from] CreationError),

    /// An authenticated call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClientError {
    /// Route to navigate to after this error, if the session is gone.
    #[must_use]
    pub const fn redirect_to(&self) -> Option<&'static str> {
        match self {
            Self::Api(e) => e.redirect_to(),
            Self::Creation(e) => e.redirect_to(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_passes_through() {
        let err = ClientError::from(ApiError::NotAuthenticated);
        assert_eq!(err.redirect_to(), Some("/"));
        assert_eq!(err.to_string(), "not logged in");

        let err = ClientError::from(ConfigError::NoConfigDir);
        assert_eq!(err.redirect_to(), None);
    }
}
