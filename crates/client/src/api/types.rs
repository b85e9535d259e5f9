//! Request and response types for the authenticated API.

use chrono::{DateTime, NaiveDateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use agent_portal_core::{AgentId, Email, Role, UserId};

use super::ApiError;

/// Reply text the agent uses when it cannot answer.
pub const LIVE_AGENT_PROMPT: &str = "Would you like to chat with a live agent?";

// =============================================================================
// Users
// =============================================================================

/// A user as listed by `GET /users` and embedded in agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Server-assigned ID.
    pub id: UserId,
    /// Login name.
    #[serde(default)]
    pub name: String,
    /// Role; absent when the server reports one the client does not know.
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub(crate) struct UserList {
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

/// The logged-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
}

impl Profile {
    /// First and last name joined, if either is set.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Changes to the logged-in user's profile. Unset fields are left alone.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    /// Required whenever `new_password` is set.
    pub old_password: Option<SecretString>,
    pub new_password: Option<SecretString>,
}

#[derive(Serialize)]
pub(crate) struct ProfileUpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    firstname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lastname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_password: Option<&'a str>,
}

impl ProfileUpdate {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.firstname.is_none()
            && self.lastname.is_none()
            && self.email.is_none()
            && self.old_password.is_none()
            && self.new_password.is_none()
    }

    /// Check the update and produce the request body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if nothing is set, the email is
    /// malformed, or a new password is given without the old one.
    pub(crate) fn to_body(&self) -> Result<ProfileUpdateBody<'_>, ApiError> {
        if self.is_empty() {
            return Err(ApiError::InvalidInput("nothing to update".to_string()));
        }
        if let Some(email) = &self.email {
            Email::parse(email).map_err(|e| ApiError::InvalidInput(format!("email: {e}")))?;
        }

        let new_password = non_empty_secret(self.new_password.as_ref());
        let old_password = non_empty_secret(self.old_password.as_ref());
        if new_password.is_some() && old_password.is_none() {
            return Err(ApiError::InvalidInput(
                "old password is required to change password".to_string(),
            ));
        }

        Ok(ProfileUpdateBody {
            firstname: self.firstname.as_deref(),
            lastname: self.lastname.as_deref(),
            email: self.email.as_deref(),
            old_password,
            new_password,
        })
    }
}

fn non_empty_secret(secret: Option<&SecretString>) -> Option<&str> {
    secret
        .map(ExposeSecret::expose_secret)
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Agents
// =============================================================================

/// A configured AI agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Names of the tools the agent may call.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Populated by `GET /agents/`.
    #[serde(default)]
    pub assigned_users: Vec<UserSummary>,
    /// Populated by `GET /agents/{id}`.
    #[serde(default)]
    pub assigned_user_ids: Vec<UserId>,
}

impl Agent {
    /// IDs of every assigned user, whichever form the server sent.
    #[must_use]
    pub fn assignee_ids(&self) -> Vec<UserId> {
        if self.assigned_user_ids.is_empty() {
            self.assigned_users.iter().map(|u| u.id.clone()).collect()
        } else {
            self.assigned_user_ids.clone()
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct AgentList {
    #[serde(default)]
    pub agents: Vec<Agent>,
}

/// A new agent to create.
#[derive(Debug, Clone, Default)]
pub struct NewAgent {
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
    pub assigned_user_ids: Vec<UserId>,
}

impl NewAgent {
    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("agent name is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "agent description is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Changes to an existing agent. Unset fields are left alone;
/// `assigned_user_ids`, when set, replaces every assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_ids: Option<Vec<UserId>>,
}

impl AgentUpdate {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tools.is_none()
            && self.assigned_user_ids.is_none()
    }
}

/// Acknowledgement from agent create and update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentSaved {
    #[serde(default)]
    pub message: Option<String>,
    pub agent_id: AgentId,
}

#[derive(Deserialize)]
pub(crate) struct ToolList {
    #[serde(default)]
    pub tools: Vec<String>,
}

// =============================================================================
// Chat
// =============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// One turn of a conversation with an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// A message written by the user.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// A message written by the agent.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub agent_id: &'a AgentId,
    pub message: &'a str,
    pub chat_history: &'a [ChatMessage],
}

/// The agent's answer and the full updated conversation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

impl ChatReply {
    /// Whether the agent gave up and offered a hand-off to a human.
    #[must_use]
    pub fn suggests_live_agent(&self) -> bool {
        self.response
            .to_lowercase()
            .contains(&LIVE_AGENT_PROMPT.to_lowercase())
    }
}

#[derive(Deserialize)]
pub(crate) struct ChatHistory {
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

// =============================================================================
// Letters
// =============================================================================

/// A generated letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Letter {
    /// Plain-text template output.
    Text(String),
    /// A rendered document (DOCX) to save.
    Document {
        /// Suggested file name from `Content-Disposition`.
        filename: String,
        /// Raw file content.
        bytes: Vec<u8>,
    },
}

#[derive(Serialize)]
pub(crate) struct LetterRequest<'a> {
    pub template_type: &'a str,
    pub fields: &'a std::collections::BTreeMap<String, String>,
}

#[derive(Deserialize)]
pub(crate) struct LetterText {
    pub content: String,
}

// =============================================================================
// Lenient deserializers
// =============================================================================

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

/// Accepts RFC 3339 and the naive `YYYY-MM-DD HH:MM:SS[.f]` form the server
/// stores (taken as UTC). Anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
