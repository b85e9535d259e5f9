//! Integration tests for the Agent Portal client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p agent-portal-integration-tests
//! ```
//!
//! Tests run against [`StubApi`], an in-process imitation of the portal API
//! bound to `127.0.0.1:0`. It keeps users, tokens, agents and chats in memory
//! and answers with the same shapes and status codes as the real service.
//!
//! # Seed data
//!
//! | user | password | role |
//! |------|----------|------|
//! | `admin` | `admin-pass` | admin |
//! | `bob` | `bob-pass` | employee |
//! | `carol` | `carol-pass` | customer |
//!
//! Agents: `a-hr` (assigned to bob) and `a-it` (unassigned).

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};

use agent_portal_client::{ClientConfig, MemoryBackend, PortalClient, SessionStore};

/// Reply an agent gives when it cannot answer.
pub const FALLBACK_REPLY: &str =
    "Sorry, I can't provide a valid answer for that question. Would you like to chat with a live agent?";

/// Bytes served for document letters.
pub const DOCX_BYTES: &[u8] = b"PK\x03\x04stub-docx";

const SEED_CREATED_AT: &str = "2025-01-15 09:30:00";

#[derive(Debug, Clone)]
struct StubUser {
    id: String,
    username: String,
    password: String,
    email: Option<String>,
    role: String,
    firstname: Option<String>,
    lastname: Option<String>,
}

#[derive(Debug, Clone)]
struct StubAgent {
    id: String,
    name: String,
    description: String,
    tools: Vec<String>,
    assigned: Vec<String>,
}

/// An email accepted by `POST /send-email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct StubState {
    users: Vec<StubUser>,
    tokens: HashMap<String, String>,
    agents: Vec<StubAgent>,
    chats: HashMap<(String, String), Vec<Value>>,
    emails: Vec<SentEmail>,
}

type Shared = Arc<Mutex<StubState>>;

/// In-process stub of the portal API.
pub struct StubApi {
    url: String,
    state: Shared,
    server: tokio::task::JoinHandle<()>,
}

impl StubApi {
    /// Start a seeded stub on an ephemeral port.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(seed()));

        let app = Router::new()
            .route("/login", post(login))
            .route("/register", post(register))
            .route("/create-user", post(create_user))
            .route("/users", get(list_users))
            .route("/profile", get(get_profile).put(update_profile))
            .route("/agents/", get(list_agents).post(create_agent))
            .route(
                "/agents/{id}",
                get(get_agent).put(update_agent).delete(delete_agent),
            )
            .route("/agents/{id}/clear-chat", delete(clear_chat))
            .route("/tools/", get(list_tools))
            .route("/chat/", post(chat))
            .route("/chat/{agent_id}", get(chat_history))
            .route("/letters/generate", post(generate_letter))
            .route("/send-email", post(send_email))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: format!("http://{addr}"),
            state,
            server,
        }
    }

    /// Base URL of the stub.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// A client for this stub with an in-memory session.
    ///
    /// The returned backend shares storage with the client's session store.
    #[must_use]
    pub fn client(&self) -> (PortalClient, MemoryBackend) {
        let backend = MemoryBackend::new();
        let session = SessionStore::open(backend.clone()).expect("memory backend never fails");
        let config = ClientConfig::new(&self.url, "/dev/null").expect("stub URL is valid");
        let client = PortalClient::with_session(config, session).expect("build client");
        (client, backend)
    }

    /// Configuration pointing at this stub with a file-backed session.
    #[must_use]
    pub fn config(&self, session_file: &std::path::Path) -> ClientConfig {
        ClientConfig::new(&self.url, session_file).expect("stub URL is valid")
    }

    /// Invalidate every issued token, as if they had expired server-side.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// ID of a user by name.
    #[must_use]
    pub fn user_id(&self, username: &str) -> Option<String> {
        self.lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.id.clone())
    }

    /// Role of a user by name.
    #[must_use]
    pub fn user_role(&self, username: &str) -> Option<String> {
        self.lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.role.clone())
    }

    /// Whether an agent exists.
    #[must_use]
    pub fn has_agent(&self, id: &str) -> bool {
        self.lock().agents.iter().any(|a| a.id == id)
    }

    /// User IDs assigned to an agent.
    #[must_use]
    pub fn assignees(&self, id: &str) -> Vec<String> {
        self.lock()
            .agents
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.assigned.clone())
            .unwrap_or_default()
    }

    /// Emails accepted so far.
    #[must_use]
    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.lock().emails.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        lock(&self.state)
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn seed() -> StubState {
    let user = |id: &str, username: &str, role: &str, email: Option<&str>, first: Option<&str>| {
        StubUser {
            id: id.to_string(),
            username: username.to_string(),
            password: format!("{username}-pass"),
            email: email.map(str::to_string),
            role: role.to_string(),
            firstname: first.map(str::to_string),
            lastname: None,
        }
    };

    StubState {
        users: vec![
            user("u-admin", "admin", "admin", Some("admin@example.com"), Some("Ada")),
            user("u-bob", "bob", "employee", None, None),
            user("u-carol", "carol", "customer", Some("carol@example.com"), None),
        ],
        agents: vec![
            StubAgent {
                id: "a-hr".to_string(),
                name: "HR Helper".to_string(),
                description: "Answers HR questions".to_string(),
                tools: vec!["send_email".to_string(), "generate_letter".to_string()],
                assigned: vec!["u-bob".to_string()],
            },
            StubAgent {
                id: "a-it".to_string(),
                name: "IT Desk".to_string(),
                description: "Resets passwords".to_string(),
                tools: vec![],
                assigned: vec![],
            },
        ],
        ..StubState::default()
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, StubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Errors and auth helpers
// =============================================================================

struct StubError(StatusCode, String);

impl StubError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self(status, detail.into())
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

type StubResult = Result<Json<Value>, StubError>;

/// Resolve the bearer token to a user.
fn current_user(state: &StubState, headers: &HeaderMap) -> Result<StubUser, StubError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| StubError::new(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    state
        .tokens
        .get(token)
        .and_then(|user_id| state.users.iter().find(|u| &u.id == user_id))
        .cloned()
        .ok_or_else(|| StubError::new(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
}

fn require_admin(state: &StubState, headers: &HeaderMap) -> Result<StubUser, StubError> {
    let user = current_user(state, headers)?;
    if user.role == "admin" {
        Ok(user)
    } else {
        Err(StubError::new(StatusCode::FORBIDDEN, "Admin access required"))
    }
}

async fn multipart_fields(mut multipart: Multipart) -> Result<HashMap<String, String>, StubError> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StubError::new(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| StubError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
        fields.insert(name, value);
    }
    Ok(fields)
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, StubError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| StubError::new(StatusCode::UNPROCESSABLE_ENTITY, format!("field required: {name}")))
}

fn agent_json(state: &StubState, agent: &StubAgent, detail: bool) -> Value {
    if detail {
        return json!({
            "id": agent.id,
            "name": agent.name,
            "description": agent.description,
            "tools": agent.tools,
            "created_at": SEED_CREATED_AT,
            "assigned_user_ids": agent.assigned,
        });
    }

    let assigned: Vec<Value> = state
        .users
        .iter()
        .filter(|u| agent.assigned.contains(&u.id))
        .map(|u| json!({ "id": u.id, "name": u.username, "role": u.role }))
        .collect();
    json!({
        "id": agent.id,
        "name": agent.name,
        "description": agent.description,
        "tools": agent.tools,
        "created_at": SEED_CREATED_AT,
        "assigned_users": assigned,
    })
}

fn can_use_agent(user: &StubUser, agent: &StubAgent) -> bool {
    user.role == "admin" || agent.assigned.contains(&user.id)
}

// =============================================================================
// Account handlers
// =============================================================================

async fn login(State(state): State<Shared>, Form(form): Form<HashMap<String, String>>) -> StubResult {
    let mut state = lock(&state);
    let user = state
        .users
        .iter()
        .find(|u| Some(&u.username) == form.get("username") && Some(&u.password) == form.get("password"))
        .cloned()
        .ok_or_else(|| StubError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let token = uuid::Uuid::new_v4().to_string();
    state.tokens.insert(token.clone(), user.id.clone());
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "role": user.role,
        "user_id": user.id,
    })))
}

async fn register(State(state): State<Shared>, multipart: Multipart) -> StubResult {
    let fields = multipart_fields(multipart).await?;
    if field(&fields, "role")? != "customer" {
        return Err(StubError::new(
            StatusCode::BAD_REQUEST,
            "You can only self-register as a customer",
        ));
    }

    let mut state = lock(&state);
    let username = field(&fields, "username")?.to_string();
    if state.users.iter().any(|u| u.username == username) {
        return Err(StubError::new(StatusCode::BAD_REQUEST, "Username already exists"));
    }

    let id = uuid::Uuid::new_v4().to_string();
    state.users.push(StubUser {
        id: id.clone(),
        username,
        password: field(&fields, "password")?.to_string(),
        email: Some(field(&fields, "email")?.to_string()),
        role: "customer".to_string(),
        firstname: None,
        lastname: None,
    });
    Ok(Json(json!({ "message": "User registered", "user_id": id })))
}

async fn create_user(State(state): State<Shared>, headers: HeaderMap, multipart: Multipart) -> StubResult {
    let fields = multipart_fields(multipart).await?;
    let mut state = lock(&state);
    require_admin(&state, &headers)?;

    let role = field(&fields, "role")?.to_string();
    if role != "employee" && role != "customer" {
        return Err(StubError::new(StatusCode::BAD_REQUEST, "Invalid role"));
    }
    let username = field(&fields, "username")?.to_string();
    if state.users.iter().any(|u| u.username == username) {
        return Err(StubError::new(StatusCode::BAD_REQUEST, "Username already exists"));
    }

    let id = uuid::Uuid::new_v4().to_string();
    state.users.push(StubUser {
        id: id.clone(),
        username,
        password: field(&fields, "password")?.to_string(),
        email: None,
        role,
        firstname: None,
        lastname: None,
    });
    Ok(Json(json!({ "message": "User created", "user_id": id })))
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> StubResult {
    let state = lock(&state);
    require_admin(&state, &headers)?;
    let users: Vec<Value> = state
        .users
        .iter()
        .map(|u| json!({ "id": u.id, "name": u.username, "role": u.role }))
        .collect();
    Ok(Json(json!({ "users": users })))
}

async fn get_profile(State(state): State<Shared>, headers: HeaderMap) -> StubResult {
    let state = lock(&state);
    let user = current_user(&state, &headers)?;
    Ok(Json(json!({
        "firstname": user.firstname,
        "lastname": user.lastname,
        "username": user.username,
        "email": user.email,
        "role": user.role,
    })))
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StubResult {
    let mut state = lock(&state);
    let user = current_user(&state, &headers)?;
    let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

    if let Some(new_password) = text("new_password") {
        match text("old_password") {
            None => {
                return Err(StubError::new(
                    StatusCode::BAD_REQUEST,
                    "Old password is required to change password",
                ));
            }
            Some(old) if old != user.password => {
                return Err(StubError::new(StatusCode::UNAUTHORIZED, "Old password is incorrect"));
            }
            Some(_) => {}
        }
        if let Some(stored) = state.users.iter_mut().find(|u| u.id == user.id) {
            stored.password = new_password;
        }
    }

    if let Some(stored) = state.users.iter_mut().find(|u| u.id == user.id) {
        if let Some(firstname) = text("firstname") {
            stored.firstname = Some(firstname);
        }
        if let Some(lastname) = text("lastname") {
            stored.lastname = Some(lastname);
        }
        if let Some(email) = text("email") {
            stored.email = Some(email);
        }
    }
    Ok(Json(json!({ "message": "Profile updated successfully" })))
}

// =============================================================================
// Agent handlers
// =============================================================================

async fn list_agents(State(state): State<Shared>, headers: HeaderMap) -> StubResult {
    let state = lock(&state);
    let user = current_user(&state, &headers)?;
    let agents: Vec<Value> = state
        .agents
        .iter()
        .filter(|a| can_use_agent(&user, a))
        .map(|a| agent_json(&state, a, false))
        .collect();
    Ok(Json(json!({ "agents": agents })))
}

async fn get_agent(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> StubResult {
    let state = lock(&state);
    current_user(&state, &headers)?;
    let agent = state
        .agents
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| StubError::new(StatusCode::NOT_FOUND, "Agent not found"))?;
    Ok(Json(agent_json(&state, agent, true)))
}

async fn create_agent(State(state): State<Shared>, headers: HeaderMap, multipart: Multipart) -> StubResult {
    let fields = multipart_fields(multipart).await?;
    let mut state = lock(&state);
    require_admin(&state, &headers)?;

    let parse_list = |name: &str| -> Result<Vec<String>, StubError> {
        serde_json::from_str(field(&fields, name)?)
            .map_err(|e| StubError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    };

    let id = uuid::Uuid::new_v4().to_string();
    state.agents.push(StubAgent {
        id: id.clone(),
        name: field(&fields, "name")?.to_string(),
        description: field(&fields, "description")?.to_string(),
        tools: parse_list("tools")?,
        assigned: parse_list("assigned_user_ids")?,
    });
    Ok(Json(json!({
        "message": "Agent created and assigned successfully",
        "agent_id": id,
    })))
}

async fn update_agent(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StubResult {
    let mut state = lock(&state);
    require_admin(&state, &headers)?;
    let agent = state
        .agents
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| StubError::new(StatusCode::NOT_FOUND, "Agent not found"))?;

    let list = |key: &str| -> Option<Vec<String>> {
        body.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    };
    if let Some(name) = body.get("name").and_then(Value::as_str) {
        agent.name = name.to_string();
    }
    if let Some(description) = body.get("description").and_then(Value::as_str) {
        agent.description = description.to_string();
    }
    if let Some(tools) = list("tools") {
        agent.tools = tools;
    }
    if let Some(assigned) = list("assigned_user_ids") {
        agent.assigned = assigned;
    }
    Ok(Json(json!({ "message": "Agent updated successfully", "agent_id": id })))
}

async fn delete_agent(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> StubResult {
    let mut state = lock(&state);
    require_admin(&state, &headers)?;
    let before = state.agents.len();
    state.agents.retain(|a| a.id != id);
    if state.agents.len() == before {
        return Err(StubError::new(StatusCode::NOT_FOUND, "Agent not found"));
    }
    Ok(Json(json!({ "message": "Agent deleted successfully" })))
}

async fn clear_chat(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> StubResult {
    let mut state = lock(&state);
    let user = current_user(&state, &headers)?;
    state.chats.remove(&(id, user.id));
    Ok(Json(json!({ "message": "Chat history cleared successfully" })))
}

async fn list_tools(State(state): State<Shared>, headers: HeaderMap) -> StubResult {
    let state = lock(&state);
    current_user(&state, &headers)?;
    Ok(Json(json!({ "tools": ["send_email", "generate_letter", "search_docs"] })))
}

// =============================================================================
// Chat, letters, email
// =============================================================================

async fn chat(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> StubResult {
    let mut state = lock(&state);
    let user = current_user(&state, &headers)?;
    let agent_id = body
        .get("agent_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let allowed = state
        .agents
        .iter()
        .find(|a| a.id == agent_id)
        .is_some_and(|a| can_use_agent(&user, a));
    if !allowed {
        return Err(StubError::new(
            StatusCode::FORBIDDEN,
            "You are not authorized to chat with this agent.",
        ));
    }

    let response = if message.to_lowercase().contains("meaning of life") {
        FALLBACK_REPLY.to_string()
    } else {
        format!("You said: {message}")
    };

    let mut history: Vec<Value> = body
        .get("chat_history")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    history.push(json!({ "role": "user", "content": message }));
    history.push(json!({ "role": "assistant", "content": response }));
    state
        .chats
        .insert((agent_id, user.id), history.clone());

    Ok(Json(json!({ "response": response, "chat_history": history })))
}

async fn chat_history(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(agent_id): Path<String>,
) -> StubResult {
    let state = lock(&state);
    let user = current_user(&state, &headers)?;
    let allowed = state
        .agents
        .iter()
        .find(|a| a.id == agent_id)
        .is_some_and(|a| can_use_agent(&user, a));
    if !allowed {
        return Err(StubError::new(StatusCode::FORBIDDEN, "Access denied to chat history."));
    }

    let history = state
        .chats
        .get(&(agent_id, user.id))
        .cloned()
        .unwrap_or_default();
    Ok(Json(json!({ "chat_history": history })))
}

async fn generate_letter(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Response, StubError> {
    current_user(&lock(&state), &headers)?;
    let fields = body.get("fields").cloned().unwrap_or_default();
    let field = |name: &str| {
        fields
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StubError::new(StatusCode::BAD_REQUEST, format!("Missing field: '{name}'")))
    };

    match body.get("template_type").and_then(Value::as_str) {
        Some("offer_letter") => {
            field("name")?;
            Ok((
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=offer_letter.docx",
                    ),
                ],
                DOCX_BYTES,
            )
                .into_response())
        }
        Some("welcome") => {
            let name = field("name")?;
            Ok(Json(json!({ "content": format!("Dear {name}, welcome aboard!") })).into_response())
        }
        _ => Err(StubError::new(StatusCode::BAD_REQUEST, "Invalid template type.")),
    }
}

async fn send_email(State(state): State<Shared>, headers: HeaderMap, multipart: Multipart) -> StubResult {
    let fields = multipart_fields(multipart).await?;
    let mut state = lock(&state);
    current_user(&state, &headers)?;
    state.emails.push(SentEmail {
        to: field(&fields, "to")?.to_string(),
        subject: field(&fields, "subject")?.to_string(),
        body: field(&fields, "body")?.to_string(),
    });
    Ok(Json(json!({ "message": "Email sent successfully" })))
}
