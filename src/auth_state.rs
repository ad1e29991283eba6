//! Process-wide authentication and onboarding state.
//!
//! Multiple steps mutate this state and the root controller observes it to
//! decide whether to render the onboarding flow or the main application
//! shell. Mutations are centralized behind [`AuthStore`] with an explicit,
//! enumerated set of operations; subscribers watch for changes instead of
//! polling.

use tokio::sync::watch;
use tracing::debug;

use crate::backend::BackendClient;
use crate::error::Result;
use crate::models::Session;
use crate::store::LocalStore;

/// Shared authentication/onboarding state.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    /// Signed-in session, if any
    pub session: Option<Session>,
    /// Whether a backend identity is established
    pub is_authenticated: bool,
    /// Whether the startup auth check is still running
    pub is_loading: bool,
    /// Whether onboarding has been completed
    pub has_completed_onboarding: bool,
    /// Last user-visible error, if any
    pub error: Option<String>,
}

/// Which top-level surface the root controller should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRoute {
    /// Startup check still in progress
    Loading,
    /// Onboarding flow
    Onboarding,
    /// Main application shell
    Main,
}

/// Route decision from the current state.
///
/// Onboarding completion gates the main shell; a missing session with
/// completed onboarding still renders the main shell, since protection can
/// run against a locally persisted identity.
#[must_use]
pub fn resolve_route(state: &AuthState) -> AppRoute {
    if state.is_loading {
        AppRoute::Loading
    } else if state.has_completed_onboarding {
        AppRoute::Main
    } else {
        AppRoute::Onboarding
    }
}

/// Centralized state container with watch-based subscription.
pub struct AuthStore {
    tx: watch::Sender<AuthState>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    /// Create a store in the initial loading state.
    #[must_use]
    pub fn new() -> Self {
        let initial = AuthState {
            is_loading: true,
            ..AuthState::default()
        };
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// Record a signed-in session.
    pub fn set_user(&self, session: Session) {
        self.tx.send_modify(|state| {
            state.session = Some(session);
            state.is_authenticated = true;
            state.is_loading = false;
            state.error = None;
        });
    }

    /// Toggle the startup loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.tx.send_modify(|state| state.is_loading = loading);
    }

    /// Flip the onboarding-complete flag. One-way within a session.
    pub fn set_onboarding_complete(&self, complete: bool) {
        self.tx
            .send_modify(|state| state.has_completed_onboarding = complete);
    }

    /// Record a user-visible error.
    pub fn set_error(&self, message: &str) {
        self.tx.send_modify(|state| {
            state.error = Some(message.to_string());
            state.is_loading = false;
        });
    }

    /// Clear the current error.
    pub fn clear_error(&self) {
        self.tx.send_modify(|state| state.error = None);
    }

    /// Drop the session and reset auth flags.
    pub fn logout(&self) {
        self.tx.send_modify(|state| {
            state.session = None;
            state.is_authenticated = false;
            state.is_loading = false;
            state.error = None;
        });
    }
}

/// Startup check the root controller runs before rendering anything.
///
/// Reads the local completed flag, then asks the backend for a session.
/// Backend failures leave the store unauthenticated but never block startup.
pub async fn restore_auth_state(
    store: &AuthStore,
    backend: &dyn BackendClient,
    local: &LocalStore,
) -> Result<()> {
    if local.onboarding_completed()? {
        store.set_onboarding_complete(true);
    }

    match backend.current_session().await {
        Ok(Some(session)) => {
            debug!(user_id = %session.user_id, "session restored");
            store.set_user(session);
        }
        Ok(None) => store.set_loading(false),
        Err(e) => {
            debug!(error = %e, "session restore failed");
            store.set_loading(false);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthMethod;

    #[test]
    fn initial_state_is_loading() {
        let store = AuthStore::new();
        assert_eq!(resolve_route(&store.state()), AppRoute::Loading);
    }

    #[test]
    fn incomplete_onboarding_routes_to_onboarding() {
        let store = AuthStore::new();
        store.set_loading(false);
        assert_eq!(resolve_route(&store.state()), AppRoute::Onboarding);
    }

    #[test]
    fn completed_onboarding_routes_to_main() {
        let store = AuthStore::new();
        store.set_loading(false);
        store.set_onboarding_complete(true);
        assert_eq!(resolve_route(&store.state()), AppRoute::Main);
    }

    #[test]
    fn set_user_clears_loading_and_error() {
        let store = AuthStore::new();
        store.set_error("boom");
        store.set_user(Session {
            user_id: "u1".to_string(),
            method: AuthMethod::Anonymous,
        });
        let state = store.state();
        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn subscribers_observe_completion() {
        let store = AuthStore::new();
        let mut rx = store.subscribe();
        store.set_onboarding_complete(true);
        rx.changed().await.expect("change notification");
        assert!(rx.borrow().has_completed_onboarding);
    }
}
