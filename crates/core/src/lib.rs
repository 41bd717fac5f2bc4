//! `porter-core` — pure session-domain primitives.
//!
//! This crate contains the identity model, the unverified token-claims
//! decoder and the error taxonomy. It is intentionally decoupled from
//! HTTP and storage; those live in `porter-client`.

pub mod claims;
pub mod error;
pub mod roles;
pub mod user;

pub use claims::{TokenClaims, decode_unverified};
pub use error::{AuthError, AuthResult};
pub use roles::Role;
pub use user::User;
