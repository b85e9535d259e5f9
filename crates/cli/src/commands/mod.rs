//! Command implementations.
//!
//! Each command that stands for a portal view runs the route guard for that
//! view first, so the CLI refuses exactly what the portal would redirect.

pub mod agents;
pub mod chat;
pub mod letters;
pub mod session;
pub mod users;

use agent_portal_client::{Navigation, PortalClient};

use crate::error::CliError;

/// Run the route guard for `path` against the current session.
fn guard(client: &PortalClient, path: &str) -> Result<(), CliError> {
    match client.navigate(path) {
        Navigation::Render(_) => Ok(()),
        Navigation::Redirect(target) => {
            tracing::debug!(%path, %target, "Route guard redirected command");
            Err(CliError::Redirected {
                path: path.to_string(),
                target,
            })
        }
        Navigation::NotFound => Err(CliError::NotFound(path.to_string())),
    }
}

/// Split `key=value` arguments.
fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, String)>, CliError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .ok_or_else(|| CliError::InvalidArgument(format!("expected key=value, got '{pair}'")))
        })
        .collect()
}
