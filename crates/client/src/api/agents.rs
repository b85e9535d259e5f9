//! Agent management endpoints.

use reqwest::Method;
use reqwest::multipart::Form;
use tracing::{info, instrument};

use agent_portal_core::AgentId;

use super::types::{Agent, AgentList, AgentSaved, AgentUpdate, NewAgent, ToolList};
use super::{ApiClient, ApiError, segment};

impl ApiClient<'_> {
    /// List agents visible to the current user.
    ///
    /// Admins see every agent; other roles only those assigned to them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn list_agents(&self) -> Result<Vec<Agent>, ApiError> {
        let list: AgentList = self.fetch(self.request(Method::GET, "/agents/")?).await?;
        Ok(list.agents)
    }

    /// Fetch one agent, including its assigned user IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self), fields(agent_id = %id))]
    pub async fn get_agent(&self, id: &AgentId) -> Result<Agent, ApiError> {
        let path = format!("/agents/{}", segment(id.as_str()));
        self.fetch(self.request(Method::GET, &path)?).await
    }

    /// Create an agent (admin only).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the name or description is blank,
    /// or an error if the request fails or the session is rejected.
    #[instrument(skip(self, agent), fields(name = %agent.name))]
    pub async fn create_agent(&self, agent: &NewAgent) -> Result<AgentSaved, ApiError> {
        agent.validate()?;

        let tools = serde_json::to_string(&agent.tools)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let assigned = serde_json::to_string(&agent.assigned_user_ids)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

        let form = Form::new()
            .text("name", agent.name.clone())
            .text("description", agent.description.clone())
            .text("tools", tools)
            .text("assigned_user_ids", assigned);

        let saved: AgentSaved = self
            .fetch(self.request(Method::POST, "/agents/")?.multipart(form))
            .await?;

        info!(agent_id = %saved.agent_id, "Agent created");
        Ok(saved)
    }

    /// Update an agent (admin only).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the update is empty, or an error if
    /// the request fails or the session is rejected.
    #[instrument(skip(self, update), fields(agent_id = %id))]
    pub async fn update_agent(
        &self,
        id: &AgentId,
        update: &AgentUpdate,
    ) -> Result<AgentSaved, ApiError> {
        if update.is_empty() {
            return Err(ApiError::InvalidInput("nothing to update".to_string()));
        }

        let path = format!("/agents/{}", segment(id.as_str()));
        let saved: AgentSaved = self
            .fetch(self.request(Method::PUT, &path)?.json(update))
            .await?;

        info!("Agent updated");
        Ok(saved)
    }

    /// Delete an agent (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self), fields(agent_id = %id))]
    pub async fn delete_agent(&self, id: &AgentId) -> Result<(), ApiError> {
        let path = format!("/agents/{}", segment(id.as_str()));
        self.execute(self.request(Method::DELETE, &path)?).await?;
        info!("Agent deleted");
        Ok(())
    }

    /// Delete the current user's conversation with an agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self), fields(agent_id = %id))]
    pub async fn clear_chat(&self, id: &AgentId) -> Result<(), ApiError> {
        let path = format!("/agents/{}/clear-chat", segment(id.as_str()));
        self.execute(self.request(Method::DELETE, &path)?).await?;
        info!("Chat history cleared");
        Ok(())
    }

    /// Names of the tools an agent can be given.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn list_tools(&self) -> Result<Vec<String>, ApiError> {
        let list: ToolList = self.fetch(self.request(Method::GET, "/tools/")?).await?;
        Ok(list.tools)
    }
}
