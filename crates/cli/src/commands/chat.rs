//! Chat commands.

use clap::Subcommand;

use agent_portal_client::{AgentId, PortalClient};

use super::guard;
use crate::error::CliError;
use crate::output;

#[derive(Subcommand)]
pub enum ChatAction {
    /// Send a message; the stored conversation is sent along as context
    Send {
        /// Agent ID
        agent_id: String,

        /// Message text
        message: String,

        /// Start from an empty history instead of the stored conversation
        #[arg(long)]
        fresh: bool,
    },
    /// Print the stored conversation
    History {
        /// Agent ID
        agent_id: String,
    },
}

pub async fn run(client: &PortalClient, action: ChatAction) -> Result<(), CliError> {
    match action {
        ChatAction::Send {
            agent_id,
            message,
            fresh,
        } => {
            guard(client, &format!("/chat/{agent_id}"))?;
            let agent_id = AgentId::new(agent_id);
            let api = client.api();

            let history = if fresh {
                Vec::new()
            } else {
                api.chat_history(&agent_id).await?
            };
            let reply = api.chat(&agent_id, &message, &history).await?;
            output::reply(&reply.response, reply.suggests_live_agent());
        }
        ChatAction::History { agent_id } => {
            guard(client, &format!("/chat/{agent_id}"))?;
            let history = client.api().chat_history(&AgentId::new(agent_id)).await?;
            output::transcript(&history);
        }
    }
    Ok(())
}
