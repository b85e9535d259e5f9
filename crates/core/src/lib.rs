//! Agent Portal Core - Shared types library.
//!
//! This crate provides the domain types used across all Agent Portal components:
//! - `client` - Session store, API gateway and navigation
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. The route guard lives here because it is a pure
//! decision over a [`Session`] snapshot.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, tokens, roles and the session
//! - [`access`] - Route rules, the route guard and role capabilities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;

pub use access::*;
pub use types::*;
