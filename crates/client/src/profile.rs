//! Authoritative profile resolution.

use std::sync::Arc;

use porter_core::{AuthError, AuthResult, User};

use crate::gateway::Gateway;
use crate::session::SessionState;

pub(crate) const ME_PATH: &str = "/api/v1/me";

/// Fetch the authoritative user record and reconcile it into the
/// session.
///
/// The write is tagged with the epoch observed at call time: if the
/// session ends while the request is in flight (logout, or a 401 on a
/// concurrent call), the stale response is discarded instead of
/// resurrecting the user.
///
/// On `Unauthorized` the gateway has already purged the credential and
/// emptied the session; this returns `Ok(None)` without re-raising. Any
/// other failure is surfaced but leaves the prior optimistic identity
/// in place — a transient network error must not log the user out.
pub async fn resolve(gateway: &Gateway, session: &SessionState) -> AuthResult<Option<User>> {
    let epoch = session.epoch();

    match gateway.get::<User>(ME_PATH).await {
        Ok(user) => {
            if session.set_user_guarded(epoch, user.clone()) {
                Ok(Some(user))
            } else {
                tracing::debug!("discarding profile resolved under an ended session");
                Ok(None)
            }
        }
        Err(AuthError::Unauthorized) => Ok(None),
        Err(err) => {
            tracing::warn!("profile resolution failed, keeping provisional identity: {err}");
            Err(err)
        }
    }
}

/// Fire-and-forget reconciliation used after startup and login.
///
/// The loading window is closed even when resolution fails, so the
/// session never sticks in `Loading` because of a transient error.
pub(crate) fn spawn_resolve(gateway: Arc<Gateway>, session: Arc<SessionState>) {
    let epoch = session.epoch();
    tokio::spawn(async move {
        if resolve(&gateway, &session).await.is_err() {
            session.finish_loading(epoch);
        }
    });
}
