//! Session commands: register, login, logout, whoami, open.

use secrecy::SecretString;

use agent_portal_client::{HOME_ROUTE, LOGIN_ROUTE, Navigation, PortalClient};

use crate::error::CliError;
use crate::output;

pub async fn register(
    client: &PortalClient,
    username: &str,
    email: &str,
    password: String,
) -> Result<(), CliError> {
    client
        .auth()
        .register_customer(username, &SecretString::from(password), email)
        .await?;
    output::line(format!(
        "registered {username}; log in to continue ({LOGIN_ROUTE})"
    ));
    Ok(())
}

pub async fn login(client: &PortalClient, username: &str, password: String) -> Result<(), CliError> {
    let session = client
        .auth()
        .login(username, &SecretString::from(password))
        .await?;
    let role = session.role.map_or("unknown", |role| role.as_str());
    output::line(format!(
        "logged in as {username} ({role}); continue at {HOME_ROUTE}"
    ));
    Ok(())
}

pub fn logout(client: &PortalClient) -> Result<(), CliError> {
    let route = client.auth().logout()?;
    output::line(format!("logged out; continue at {route}"));
    Ok(())
}

pub fn whoami(client: &PortalClient) {
    output::session(&client.current_session(), client.capabilities());
}

/// Report where navigating to `path` would land.
pub fn open(client: &PortalClient, path: &str) -> Result<(), CliError> {
    match client.navigate(path) {
        Navigation::Render(route) => {
            output::line(format!("render {}", route.rule.path));
            for (name, value) in &route.params {
                output::line(format!("  {name} = {value}"));
            }
            if client.shows_navbar(path) {
                output::line("  (with navigation bar)");
            }
            Ok(())
        }
        Navigation::Redirect(target) => {
            output::line(format!("redirect {target}"));
            Ok(())
        }
        Navigation::NotFound => Err(CliError::NotFound(path.to_string())),
    }
}
