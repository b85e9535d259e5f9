//! Conversations with an agent.

use reqwest::Method;
use tracing::{debug, instrument};

use agent_portal_core::AgentId;

use super::types::{ChatHistory, ChatMessage, ChatReply, ChatRequest};
use super::{ApiClient, ApiError, segment};

impl ApiClient<'_> {
    /// Send a message to an agent.
    ///
    /// `history` is the conversation so far; the reply carries the updated
    /// history including this exchange.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a blank message, or an error if
    /// the request fails or the session is rejected (including a 403 for an
    /// agent not assigned to the user).
    #[instrument(skip(self, message, history), fields(agent_id = %agent_id, turns = history.len()))]
    pub async fn chat(
        &self,
        agent_id: &AgentId,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatReply, ApiError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::InvalidInput("message is empty".to_string()));
        }

        let request = ChatRequest {
            agent_id,
            message,
            chat_history: history,
        };
        let reply: ChatReply = self
            .fetch(self.request(Method::POST, "/chat/")?.json(&request))
            .await?;

        debug!(
            live_agent = reply.suggests_live_agent(),
            "Agent replied"
        );
        Ok(reply)
    }

    /// The stored conversation between the current user and an agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self), fields(agent_id = %agent_id))]
    pub async fn chat_history(&self, agent_id: &AgentId) -> Result<Vec<ChatMessage>, ApiError> {
        let path = format!("/chat/{}", segment(agent_id.as_str()));
        let history: ChatHistory = self.fetch(self.request(Method::GET, &path)?).await?;
        Ok(history.chat_history)
    }
}
