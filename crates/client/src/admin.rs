//! Role-gated administrative user management.

use std::sync::Arc;

use serde::Serialize;

use porter_core::{AuthError, AuthResult, Role, User};

use crate::client::AuthClient;
use crate::gateway::Gateway;
use crate::session::SessionState;

pub(crate) const USERS_PATH: &str = "/api/v1/users";

/// Payload for creating a user record. The password must be non-empty;
/// callers that want a provisional credential supply a generated one.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Partial update; unset fields keep their server-side value.
///
/// `password` is sent only when a non-empty replacement is given, so
/// the server retains the prior credential otherwise. An empty string
/// and an unset field produce identical outbound payloads.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    /// Treat an empty replacement password as "keep the current one".
    fn normalized(mut self) -> Self {
        if self.password.as_deref() == Some("") {
            self.password = None;
        }
        self
    }
}

/// Administrative operations over user records.
///
/// Handed out by [`AuthClient::admin`] only while the session holds the
/// ADMIN role. Every method re-checks the live session role before
/// dispatch, so a reference captured before a role change fails with
/// `Forbidden` instead of reaching the server; the server enforces the
/// same rule independently.
#[derive(Clone)]
pub struct AdminOps {
    gateway: Arc<Gateway>,
    session: Arc<SessionState>,
}

impl AdminOps {
    fn ensure_admin(&self) -> AuthResult<()> {
        match self.session.snapshot().user {
            Some(user) if user.is_admin() => Ok(()),
            _ => Err(AuthError::forbidden("user management requires the ADMIN role")),
        }
    }

    pub async fn list(&self) -> AuthResult<Vec<User>> {
        self.ensure_admin()?;
        self.gateway.get(USERS_PATH).await
    }

    pub async fn create(&self, user: NewUser) -> AuthResult<User> {
        self.ensure_admin()?;
        if user.password.is_empty() {
            return Err(AuthError::invalid("a new user needs a non-empty password"));
        }
        self.gateway.post(USERS_PATH, &user).await
    }

    pub async fn update(&self, id: &str, update: UserUpdate) -> AuthResult<User> {
        self.ensure_admin()?;
        self.gateway
            .put(&format!("{USERS_PATH}/{id}"), &update.normalized())
            .await
    }

    pub async fn delete(&self, id: &str) -> AuthResult<()> {
        self.ensure_admin()?;
        self.gateway.delete(&format!("{USERS_PATH}/{id}")).await
    }
}

impl AuthClient {
    /// The administrative surface, present only while the session's
    /// role grants it.
    ///
    /// The capability is decided from the live session snapshot on
    /// every call; re-evaluate after any session transition rather than
    /// holding the returned value. Role is never cached separately from
    /// the session, so a server-side role change takes effect as soon
    /// as the profile is re-resolved.
    pub fn admin(&self) -> Option<AdminOps> {
        let snapshot = self.session.snapshot();
        if snapshot.user.as_ref().is_some_and(User::is_admin) {
            Some(AdminOps {
                gateway: Arc::clone(&self.gateway),
                session: Arc::clone(&self.session),
            })
        } else {
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
