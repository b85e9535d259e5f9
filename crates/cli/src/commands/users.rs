//! User and profile commands.

use clap::Subcommand;
use secrecy::SecretString;

use agent_portal_client::api::ProfileUpdate;
use agent_portal_client::{PortalClient, Role};

use super::guard;
use crate::error::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum UsersAction {
    /// Create an employee or customer account (admin)
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Role (`employee` or `customer`)
        #[arg(short, long, default_value = "employee")]
        role: Role,

        /// Initial password
        #[arg(long, env = "AGENT_PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List every account (admin)
    List,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show your profile
    Show,
    /// Change profile fields; unset fields are kept
    Update {
        #[arg(long)]
        firstname: Option<String>,

        #[arg(long)]
        lastname: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Current password (required with --new-password)
        #[arg(long, env = "AGENT_PORTAL_OLD_PASSWORD", hide_env_values = true)]
        old_password: Option<String>,

        /// New password
        #[arg(long, env = "AGENT_PORTAL_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
}

pub async fn run_users(client: &PortalClient, action: UsersAction) -> Result<(), CliError> {
    match action {
        UsersAction::Create {
            username,
            role,
            password,
        } => {
            guard(client, "/create-user")?;
            let record = client
                .auth()
                .create_user(&username, &SecretString::from(password), role)
                .await?;
            output::line(format!(
                "created {} {} ({})",
                record.role, record.username, record.user_id
            ));
        }
        UsersAction::List => {
            // Listing users backs the agent assignment views.
            guard(client, "/create-agent")?;
            output::users(&client.api().list_users().await?);
        }
    }
    Ok(())
}

pub async fn run_profile(client: &PortalClient, action: ProfileAction) -> Result<(), CliError> {
    match action {
        ProfileAction::Show => {
            guard(client, "/profile")?;
            output::profile(&client.api().profile().await?);
        }
        ProfileAction::Update {
            firstname,
            lastname,
            email,
            old_password,
            new_password,
        } => {
            guard(client, "/edit-profile")?;
            let update = ProfileUpdate {
                firstname,
                lastname,
                email,
                old_password: old_password.map(SecretString::from),
                new_password: new_password.map(SecretString::from),
            };
            client.api().update_profile(&update).await?;
            output::line("profile updated");
        }
    }
    Ok(())
}
