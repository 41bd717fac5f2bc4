//! `porter-client`
//!
//! **Responsibility:** the session and authorization core for
//! applications built against the Porter authentication service.
//!
//! This crate provides:
//! - Durable storage for the bearer credential
//! - Optimistic, claims-seeded session state reconciled against the
//!   authoritative profile endpoint
//! - Credential injection and uniform rejection handling for outbound
//!   calls
//! - A role-gated administrative user-management surface
//!
//! The consuming application (routing, pages, forms) is a **thin
//! shell** around [`AuthClient`].

pub mod admin;
pub mod client;
pub mod config;
pub mod exchange;
pub mod gateway;
pub mod profile;
pub mod session;
pub mod store;

pub use admin::{AdminOps, NewUser, UserUpdate};
pub use client::AuthClient;
pub use config::ClientConfig;
pub use gateway::Gateway;
pub use session::{SessionSnapshot, SessionState};
pub use store::{MemoryTokenStore, SqliteTokenStore, TokenStore};

pub use porter_core::{AuthError, AuthResult, Role, TokenClaims, User, decode_unverified};
