//! Credential exchange: login, logout and registration.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use porter_core::{AuthError, AuthResult, decode_unverified};

use crate::client::AuthClient;
use crate::profile;

pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const REGISTER_PATH: &str = "/auth/register";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    password: &'a str,
}

impl AuthClient {
    /// Exchange credentials for a bearer token and start a new session.
    ///
    /// On any failure nothing changes: the prior session, if one exists,
    /// stays intact and the error carries the server-supplied message.
    /// On success the token is persisted, the claims-seeded user becomes
    /// observable immediately, and the authoritative profile fetch runs
    /// in the background; consumers may briefly see claims-derived data
    /// superseded by authoritative data.
    ///
    /// This call deliberately bypasses the gateway's 401 policy: a
    /// wrong-password attempt answers 401, and that must not purge the
    /// caller's current credential.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<()> {
        let body = serde_json::to_value(LoginRequest { email, password })
            .map_err(|err| AuthError::invalid(err.to_string()))?;
        let response = self
            .gateway
            .send_public(Method::POST, LOGIN_PATH, Some(body))
            .await?;
        let LoginResponse { token } = response.json()?;

        self.store.save(&token).await?;
        self.session.begin_cycle();

        match decode_unverified(&token) {
            Ok(claims) => {
                let mut user = claims.to_user();
                if user.email.is_empty() {
                    user.email = email.to_string();
                }
                self.session.set_user(user);
            }
            Err(err) => {
                // The token was just issued; skip the optimistic seed
                // and let the authoritative fetch settle the session.
                tracing::warn!("issued token has no decodable claims: {err}");
            }
        }

        profile::spawn_resolve(Arc::clone(&self.gateway), Arc::clone(&self.session));
        tracing::info!("session started for {email}");
        Ok(())
    }

    /// End the session locally. Always succeeds; no server interaction.
    pub async fn logout(&self) {
        if let Err(err) = self.store.clear().await {
            tracing::warn!("failed to purge persisted credential on logout: {err}");
        }
        self.session.invalidate();
        tracing::info!("session ended by logout");
    }

    /// Create an account. Unauthenticated; never touches the session.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> AuthResult<()> {
        let body = serde_json::to_value(RegisterRequest {
            name,
            email,
            phone,
            password,
        })
        .map_err(|err| AuthError::invalid(err.to_string()))?;
        self.gateway
            .send_public(Method::POST, REGISTER_PATH, Some(body))
            .await?;
        Ok(())
    }
}
