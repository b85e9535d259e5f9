//! Agent Portal client library.
//!
//! Session handling and API access for the Agent Portal:
//! - [`session`] - the session store and its persistence backends
//! - [`gateway`] - login, self-registration, admin user creation, logout
//! - [`api`] - agents, users, profile, chat, letters and email
//! - [`config`] - environment-driven configuration
//!
//! Route rules and the route guard live in `agent_portal_core` and are
//! re-exported here.
//!
//! # Security
//!
//! The route guard and [`Capabilities`] only decide what the client shows.
//! The remote API enforces every permission; a 401 or 403 from it clears the
//! session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
mod transport;

pub use agent_portal_core::*;
pub use api::ApiClient;
pub use client::PortalClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use gateway::{AuthError, AuthGateway, CreationError, RegistrationError, UserRecord};
pub use session::{FileBackend, MemoryBackend, SessionBackend, SessionError, SessionStore};
pub use transport::Transport;
