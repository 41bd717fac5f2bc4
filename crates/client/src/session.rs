//! In-memory session record, the single source of truth the rest of the
//! application observes.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

use porter_core::User;

/// Point-in-time view of the session.
///
/// `user` is present iff a bearer token is currently held and has not
/// been rejected by the server. `is_loading` is true only during the
/// bounded window between process start (or login submission) and the
/// first resolution of identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub is_loading: bool,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug)]
struct Inner {
    user: Option<User>,
    is_loading: bool,
    epoch: u64,
}

/// Mutable session record with change notification.
///
/// Every mutation goes through this type. The epoch counter
/// distinguishes successive login/logout cycles: asynchronous work is
/// tagged with the epoch it was issued under, and a guarded write whose
/// epoch is stale is discarded, so a response that arrives after the
/// session ended can never resurrect `user`.
#[derive(Debug)]
pub struct SessionState {
    inner: Mutex<Inner>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionState {
    pub fn new() -> Self {
        let initial = SessionSnapshot {
            user: None,
            is_loading: true,
        };
        let (tx, _rx) = watch::channel(initial);
        Self {
            inner: Mutex::new(Inner {
                user: None,
                is_loading: true,
                epoch: 0,
            }),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Mutations never panic while holding the lock; recover the
        // guard anyway rather than poisoning the whole session.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, inner: &Inner) {
        self.tx.send_replace(SessionSnapshot {
            user: inner.user.clone(),
            is_loading: inner.is_loading,
        });
    }

    /// Current snapshot, for one-shot reads.
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            user: inner.user.clone(),
            is_loading: inner.is_loading,
        }
    }

    /// Receiver that yields a fresh snapshot on every transition, for
    /// reactive consumption.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Epoch of the current login/logout cycle.
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Start a new cycle (login): later guarded writes from older cycles
    /// are discarded. Returns the new epoch.
    pub(crate) fn begin_cycle(&self) -> u64 {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.is_loading = true;
        self.publish(&inner);
        inner.epoch
    }

    /// Record a resolved identity.
    pub(crate) fn set_user(&self, user: User) {
        let mut inner = self.lock();
        inner.user = Some(user);
        inner.is_loading = false;
        self.publish(&inner);
    }

    /// Record a resolved identity only if the session is still in the
    /// cycle the work was issued under. Returns whether the write took.
    pub(crate) fn set_user_guarded(&self, epoch: u64, user: User) -> bool {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return false;
        }
        inner.user = Some(user);
        inner.is_loading = false;
        self.publish(&inner);
        true
    }

    /// Leave the loading window without an identity change, if still in
    /// the issuing cycle.
    pub(crate) fn finish_loading(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch == epoch && inner.is_loading {
            inner.is_loading = false;
            self.publish(&inner);
        }
    }

    /// Settle as unauthenticated without ending a cycle (absent or
    /// unusable token at startup).
    pub(crate) fn settle_unauthenticated(&self) {
        let mut inner = self.lock();
        inner.user = None;
        inner.is_loading = false;
        self.publish(&inner);
    }

    /// End the session (logout or credential rejection). Bumps the
    /// epoch so in-flight work from the ended cycle is discarded.
    pub(crate) fn invalidate(&self) {
        let mut inner = self.lock();
        inner.user = None;
        inner.is_loading = false;
        inner.epoch += 1;
        self.publish(&inner);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use porter_core::Role;

    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            name: None,
            phone: None,
            role: Some(Role::USER),
            avatar: None,
        }
    }

    #[test]
    fn starts_loading_and_unauthenticated() {
        let session = SessionState::new();
        let snapshot = session.snapshot();
        assert!(snapshot.user.is_none());
        assert!(snapshot.is_loading);
    }

    #[test]
    fn settling_ends_the_loading_window() {
        let session = SessionState::new();
        session.settle_unauthenticated();

        let snapshot = session.snapshot();
        assert!(snapshot.user.is_none());
        assert!(!snapshot.is_loading);
    }

    #[test]
    fn guarded_write_from_a_stale_cycle_is_discarded() {
        let session = SessionState::new();
        let stale = session.epoch();

        session.invalidate(); // the cycle ended while work was in flight

        assert!(!session.set_user_guarded(stale, user("u-1")));
        assert!(session.snapshot().user.is_none());

        let current = session.epoch();
        assert!(session.set_user_guarded(current, user("u-2")));
        assert_eq!(session.snapshot().user.unwrap().id, "u-2");
    }

    #[test]
    fn invalidate_empties_the_session() {
        let session = SessionState::new();
        session.set_user(user("u-1"));
        assert!(session.snapshot().is_authenticated());

        session.invalidate();
        let snapshot = session.snapshot();
        assert!(snapshot.user.is_none());
        assert!(!snapshot.is_loading);
    }

    #[test]
    fn finish_loading_only_applies_to_the_issuing_cycle() {
        let session = SessionState::new();
        let epoch = session.begin_cycle();
        session.invalidate();
        let after = session.begin_cycle();

        session.finish_loading(epoch); // stale; must not touch the new cycle
        assert!(session.snapshot().is_loading);

        session.finish_loading(after);
        assert!(!session.snapshot().is_loading);
    }

    #[test]
    fn subscribers_see_transitions() {
        let session = SessionState::new();
        let rx = session.subscribe();

        session.set_user(user("u-1"));
        assert_eq!(rx.borrow().user.as_ref().unwrap().id, "u-1");

        session.invalidate();
        assert!(rx.borrow().user.is_none());
    }
}
