//! Auth gateway error types.

use reqwest::StatusCode;
use thiserror::Error;

use agent_portal_core::{ENTRY_ROUTE, EmailError, Role};

use crate::session::SessionError;

/// Errors that can occur while logging in.
///
/// Bad credentials and server failures are deliberately not distinguished;
/// both arrive as `Rejected`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The API answered with a non-2xx status.
    #[error("login rejected ({status}): {message}")]
    Rejected {
        /// Status returned by the API.
        status: StatusCode,
        /// Server-provided detail.
        message: String,
    },

    /// The API could not be reached.
    #[error("server unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The API answered 2xx with a body the client cannot use.
    #[error("invalid login response: {0}")]
    InvalidResponse(String),

    /// The session could not be persisted.
    #[error("could not store session: {0}")]
    Session(#[from] SessionError),
}

/// Errors that can occur during self-registration.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A required field was empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The email failed local validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The API answered with a non-2xx status (e.g. username taken).
    #[error("registration rejected ({status}): {message}")]
    Rejected {
        /// Status returned by the API.
        status: StatusCode,
        /// Server-provided detail.
        message: String,
    },

    /// The API could not be reached.
    #[error("server unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
}

/// Errors that can occur when an admin creates a user.
#[derive(Debug, Error)]
pub enum CreationError {
    /// A required field was empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Only employee and customer accounts can be created.
    #[error("cannot create a user with role {0}")]
    RoleNotAssignable(Role),

    /// No session token to send.
    #[error("not logged in")]
    NotAuthenticated,

    /// The API rejected the session token; the session has been cleared.
    #[error("session rejected ({status}); log in again")]
    SessionRejected {
        /// 401 or 403.
        status: StatusCode,
    },

    /// The API answered with another non-2xx status.
    #[error("user creation rejected ({status}): {message}")]
    Rejected {
        /// Status returned by the API.
        status: StatusCode,
        /// Server-provided detail.
        message: String,
    },

    /// The API could not be reached.
    #[error("server unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The API answered 2xx with a body the client cannot use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl CreationError {
    /// Route to navigate to after this error, if the session is gone.
    #[must_use]
    pub const fn redirect_to(&self) -> Option<&'static str> {
        match self {
            Self::NotAuthenticated | Self::SessionRejected { .. } => Some(ENTRY_ROUTE),
            _ => None,
        }
    }
}
