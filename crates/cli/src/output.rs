//! Terminal output.
//!
//! Results go to stdout; errors and hints to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use agent_portal_client::api::{Agent, ChatMessage, ChatRole, Profile, UserSummary};
use agent_portal_client::{Capabilities, Session};

use crate::error::CliError;

/// Print a line of output.
pub fn line(text: impl std::fmt::Display) {
    println!("{text}");
}

/// Report a failed command.
pub fn error(e: &CliError) {
    eprintln!("error: {e}");
    if let Some(route) = e.redirect_to() {
        eprintln!("hint: continue at {route}");
    }
}

pub fn session(session: &Session, caps: Capabilities) {
    if !session.is_authenticated() {
        println!("not logged in");
        return;
    }

    println!(
        "user:     {}",
        session.username.as_deref().unwrap_or("(unknown)")
    );
    println!(
        "user id:  {}",
        session.user_id.as_ref().map_or("(unknown)", |id| id.as_str())
    );
    println!(
        "role:     {}",
        session.role.map_or("(unknown)", |role| role.as_str())
    );

    let mut allowed = Vec::new();
    if caps.chat {
        allowed.push("chat");
    }
    if caps.manage_agents {
        allowed.push("manage agents");
    }
    if caps.create_users {
        allowed.push("create users");
    }
    println!(
        "can:      {}",
        if allowed.is_empty() {
            "-".to_string()
        } else {
            allowed.join(", ")
        }
    );
}

pub fn agents(agents: &[Agent]) {
    if agents.is_empty() {
        println!("no agents");
        return;
    }
    for agent in agents {
        let created = agent
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("{}  {}  {}", agent.id, agent.name, created);
        if !agent.description.is_empty() {
            println!("    {}", agent.description);
        }
        if !agent.assigned_users.is_empty() {
            let names: Vec<&str> = agent.assigned_users.iter().map(|u| u.name.as_str()).collect();
            println!("    assigned: {}", names.join(", "));
        }
    }
}

pub fn agent(agent: &Agent) {
    println!("id:          {}", agent.id);
    println!("name:        {}", agent.name);
    println!("description: {}", agent.description);
    println!("tools:       {}", agent.tools.join(", "));
    if let Some(created) = agent.created_at {
        println!("created:     {}", created.to_rfc3339());
    }
    let assignees: Vec<String> = agent
        .assignee_ids()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("assigned:    {}", assignees.join(", "));
}

pub fn users(users: &[UserSummary]) {
    for user in users {
        println!(
            "{}  {}  {}",
            user.id,
            user.name,
            user.role.map_or("?", |role| role.as_str())
        );
    }
}

pub fn profile(profile: &Profile) {
    let unset = "-";
    println!("name:     {}", profile.full_name().as_deref().unwrap_or(unset));
    println!("username: {}", profile.username.as_deref().unwrap_or(unset));
    println!("email:    {}", profile.email.as_deref().unwrap_or(unset));
    println!(
        "role:     {}",
        profile.role.map_or(unset, |role| role.as_str())
    );
}

pub fn transcript(messages: &[ChatMessage]) {
    if messages.is_empty() {
        println!("no messages yet");
        return;
    }
    for message in messages {
        println!("{}: {}", speaker(message.role), message.content);
    }
}

pub fn reply(text: &str, live_agent: bool) {
    println!("{}: {text}", speaker(ChatRole::Assistant));
    if live_agent {
        eprintln!("hint: this agent could not answer; contact a live agent");
    }
}

const fn speaker(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "you",
        ChatRole::Assistant => "agent",
        ChatRole::System => "system",
    }
}
