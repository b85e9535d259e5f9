//! Agent management commands.

use clap::Subcommand;

use agent_portal_client::api::{AgentUpdate, NewAgent};
use agent_portal_client::{AgentId, DASHBOARD_ROUTE, PortalClient, UserId};

use super::guard;
use crate::error::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum AgentsAction {
    /// List the agents you can use
    List,
    /// Show one agent
    Show {
        /// Agent ID
        id: String,
    },
    /// Create an agent (admin)
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: String,

        /// Tool the agent may call (repeatable)
        #[arg(short, long = "tool")]
        tools: Vec<String>,

        /// User to assign (repeatable)
        #[arg(short, long = "assign")]
        assign: Vec<String>,
    },
    /// Update an agent (admin)
    Update {
        /// Agent ID
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Replace the tool list (repeatable)
        #[arg(short, long = "tool")]
        tools: Option<Vec<String>>,

        /// Replace the assigned users (repeatable)
        #[arg(short, long = "assign")]
        assign: Option<Vec<String>>,

        /// Remove every assigned user
        #[arg(long, conflicts_with = "assign")]
        unassign_all: bool,
    },
    /// Delete an agent (admin)
    Delete {
        /// Agent ID
        id: String,
    },
    /// Delete your conversation with an agent
    ClearChat {
        /// Agent ID
        id: String,
    },
}

pub async fn run(client: &PortalClient, action: AgentsAction) -> Result<(), CliError> {
    match action {
        AgentsAction::List => {
            guard(client, DASHBOARD_ROUTE)?;
            output::agents(&client.api().list_agents().await?);
        }
        AgentsAction::Show { id } => {
            guard(client, DASHBOARD_ROUTE)?;
            output::agent(&client.api().get_agent(&AgentId::new(id)).await?);
        }
        AgentsAction::Create {
            name,
            description,
            tools,
            assign,
        } => {
            guard(client, "/create-agent")?;
            let agent = NewAgent {
                name,
                description,
                tools,
                assigned_user_ids: assign.into_iter().map(UserId::new).collect(),
            };
            let saved = client.api().create_agent(&agent).await?;
            output::line(format!("created agent {}", saved.agent_id));
        }
        AgentsAction::Update {
            id,
            name,
            description,
            tools,
            assign,
            unassign_all,
        } => {
            guard(client, &format!("/update/{id}"))?;
            let assigned_user_ids = if unassign_all {
                Some(Vec::new())
            } else {
                assign.map(|ids| ids.into_iter().map(UserId::new).collect())
            };
            let update = AgentUpdate {
                name,
                description,
                tools,
                assigned_user_ids,
            };
            let saved = client
                .api()
                .update_agent(&AgentId::new(id), &update)
                .await?;
            output::line(format!("updated agent {}", saved.agent_id));
        }
        AgentsAction::Delete { id } => {
            // Deletion is offered from the dashboard to admins only.
            guard(client, &format!("/update/{id}"))?;
            client.api().delete_agent(&AgentId::new(id.clone())).await?;
            output::line(format!("deleted agent {id}"));
        }
        AgentsAction::ClearChat { id } => {
            guard(client, &format!("/chat/{id}"))?;
            client.api().clear_chat(&AgentId::new(id.clone())).await?;
            output::line(format!("cleared chat with {id}"));
        }
    }
    Ok(())
}

pub async fn tools(client: &PortalClient) -> Result<(), CliError> {
    guard(client, DASHBOARD_ROUTE)?;
    for tool in client.api().list_tools().await? {
        output::line(tool);
    }
    Ok(())
}
