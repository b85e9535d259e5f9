//! API client error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling an authenticated endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session token; nothing was sent.
    #[error("not logged in")]
    NotAuthenticated,

    /// The API answered 401 or 403. The session has been cleared.
    #[error("session rejected ({status}); log in again")]
    SessionRejected {
        /// 401 or 403.
        status: StatusCode,
        /// Route the caller should navigate to.
        redirect_to: &'static str,
    },

    /// The API answered with another non-2xx status.
    #[error("request failed ({status}): {message}")]
    Status {
        /// Status returned by the API.
        status: StatusCode,
        /// Server-provided detail.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 2xx with a body the client cannot use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request was rejected locally before sending.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Route to navigate to after this error, if the session is gone.
    #[must_use]
    pub const fn redirect_to(&self) -> Option<&'static str> {
        match self {
            Self::SessionRejected { redirect_to, .. } => Some(*redirect_to),
            Self::NotAuthenticated => Some(agent_portal_core::ENTRY_ROUTE),
            _ => None,
        }
    }

    /// Whether the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: "Agent not found".to_string(),
        };
        assert_eq!(err.to_string(), "request failed (404 Not Found): Agent not found");
        assert!(err.is_not_found());
        assert_eq!(err.redirect_to(), None);
    }

    #[test]
    fn test_session_rejection_carries_redirect() {
        let err = ApiError::SessionRejected {
            status: StatusCode::UNAUTHORIZED,
            redirect_to: "/",
        };
        assert_eq!(err.redirect_to(), Some("/"));
        assert_eq!(ApiError::NotAuthenticated.redirect_to(), Some("/"));
    }
}
