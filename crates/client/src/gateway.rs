//! Outbound HTTP dispatch with credential injection and uniform
//! rejection handling.

use std::sync::Arc;

use reqwest::{Method, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;

use porter_core::{AuthError, AuthResult};

use crate::session::SessionState;
use crate::store::TokenStore;

/// Dispatches requests to the service, attaching the bearer credential
/// when one is held.
///
/// Response handling is uniform across every caller:
/// - 401 purges the credential store and empties the session *before*
///   the `Unauthorized` error surfaces; callers must not repeat that
///   cleanup.
/// - Any other non-2xx becomes `Http { status, message }`, with the
///   server's `{message}` body when it parses.
/// - A request that never produced a response becomes `Transport`.
///
/// No retries happen here; retry policy belongs to the calling layer.
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    session: Arc<SessionState>,
}

impl Gateway {
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<dyn TokenStore>,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Dispatch with credential injection and the 401 policy.
    ///
    /// If no token is held the header is simply omitted; callers that
    /// require authentication learn it from the resulting 401 rather
    /// than a client-side pre-check, keeping the server the single
    /// source of truth for authorization.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> AuthResult<ApiResponse> {
        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = self.store.load().await? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AuthError::transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AuthError::transport(err.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(%method, path, "credential rejected; ending session");
            self.invalidate().await;
            return Err(AuthError::Unauthorized);
        }
        if !status.is_success() {
            return Err(AuthError::http(status.as_u16(), error_message(&bytes, status)));
        }

        Ok(ApiResponse {
            body: bytes.to_vec(),
        })
    }

    /// Dispatch without credential injection or rejection side effects.
    ///
    /// The credential exchange uses this: a wrong-password login answers
    /// 401 and that must not purge the caller's current session.
    pub(crate) async fn send_public(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> AuthResult<ApiResponse> {
        let mut request = self
            .http
            .request(method, self.url(path))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AuthError::transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AuthError::transport(err.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::http(status.as_u16(), error_message(&bytes, status)));
        }

        Ok(ApiResponse {
            body: bytes.to_vec(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        self.send(Method::GET, path, None).await?.json()
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> AuthResult<T> {
        self.send(Method::POST, path, Some(encode(body)?)).await?.json()
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> AuthResult<T> {
        self.send(Method::PUT, path, Some(encode(body)?)).await?.json()
    }

    pub async fn delete(&self, path: &str) -> AuthResult<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// 401 cleanup: purge the credential, end the session.
    async fn invalidate(&self) {
        if let Err(err) = self.store.clear().await {
            tracing::warn!("failed to purge rejected credential: {err}");
        }
        self.session.invalidate();
    }
}

/// Successful response body, decoded on demand.
pub struct ApiResponse {
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> AuthResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|err| AuthError::transport(format!("invalid response body: {err}")))
    }
}

fn encode(body: &impl Serialize) -> AuthResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|err| AuthError::invalid(err.to_string()))
}

/// Pull the server-supplied `{message}` out of an error body, falling
/// back to the status line.
fn error_message(bytes: &[u8], status: StatusCode) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_slice::<ErrorBody>(bytes)
        .map(|body| body.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}
