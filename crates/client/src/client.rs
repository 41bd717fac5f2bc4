//! Composition root for the session core.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use porter_core::{AuthResult, User, decode_unverified};

use crate::config::ClientConfig;
use crate::gateway::Gateway;
use crate::profile;
use crate::session::{SessionSnapshot, SessionState};
use crate::store::TokenStore;

/// Leeway applied when checking a persisted token's embedded expiry,
/// absorbing clock skew between client and issuer.
pub(crate) const EXPIRY_LEEWAY_SECS: i64 = 30;

/// The session and authorization core.
///
/// Owned by the application's composition root and passed by reference
/// to whichever layer needs it; there is no hidden global, so tests can
/// construct independent instances against independent stores.
pub struct AuthClient {
    pub(crate) config: ClientConfig,
    pub(crate) store: Arc<dyn TokenStore>,
    pub(crate) session: Arc<SessionState>,
    pub(crate) gateway: Arc<Gateway>,
    initialized: AtomicBool,
}

impl AuthClient {
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Self {
        let session = Arc::new(SessionState::new());
        let gateway = Arc::new(Gateway::new(
            config.base_url.clone(),
            Arc::clone(&store),
            Arc::clone(&session),
        ));
        Self {
            config,
            store,
            session,
            gateway,
            initialized: AtomicBool::new(false),
        }
    }

    /// Restore the persisted session, if any. Idempotent; call once at
    /// startup.
    ///
    /// Seeds the session from the stored token's claims (fast, local,
    /// optimistic), then reconciles against the profile endpoint in the
    /// background. A token that is missing, undecodable or locally
    /// expired settles the session as unauthenticated — undecodable and
    /// expired tokens are purged on the spot.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        let token = match self.store.load().await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("credential store unavailable at startup: {err}");
                self.session.settle_unauthenticated();
                return;
            }
        };

        let Some(token) = token else {
            self.session.settle_unauthenticated();
            return;
        };

        match decode_unverified(&token) {
            Ok(claims) if claims.is_expired(EXPIRY_LEEWAY_SECS) => {
                tracing::info!("persisted token is expired; discarding");
                self.purge_token().await;
                self.session.settle_unauthenticated();
            }
            Ok(claims) => {
                self.session.set_user(claims.to_user());
                profile::spawn_resolve(Arc::clone(&self.gateway), Arc::clone(&self.session));
            }
            Err(err) => {
                tracing::warn!("persisted token is not decodable: {err}");
                self.purge_token().await;
                self.session.settle_unauthenticated();
            }
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Receiver yielding a snapshot on every session transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.subscribe()
    }

    /// Fetch the authoritative profile and reconcile it into the
    /// session. See [`crate::profile::resolve`] for the failure policy.
    pub async fn resolve_profile(&self) -> AuthResult<Option<User>> {
        profile::resolve(&self.gateway, &self.session).await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) async fn purge_token(&self) {
        if let Err(err) = self.store.clear().await {
            tracing::warn!("failed to purge persisted credential: {err}");
        }
    }
}
