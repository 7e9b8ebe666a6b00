//! Session Module
//!
//! Owns the token lifecycle and exposes the login state to the rest of
//! the app as a watchable value.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::storage::{StorageError, TokenStore};

/// Login state as seen by every other component.
///
/// `Loading` means the stored token has not been read yet; it must not be
/// treated as logged out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Authenticated(String),
    Unauthenticated,
}

impl SessionState {
    /// The bearer token, when authenticated.
    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Observable session state backed by the token store.
///
/// Only `login` and `logout` mutate the state; every other component holds
/// a read handle obtained from `subscribe()`.
pub struct SessionContext {
    store: TokenStore,
    state: watch::Sender<SessionState>,
}

impl SessionContext {
    /// Create a context in the `Loading` state.
    pub fn new(store: TokenStore) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self { store, state }
    }

    /// Settle `Loading` by reading the token store once.
    ///
    /// An unreadable token settles to `Unauthenticated` rather than
    /// leaving the navigation gate stuck in `Loading`.
    pub fn initialize(&self) -> SessionState {
        let next = match self.store.get() {
            Ok(Some(token)) => SessionState::Authenticated(token),
            Ok(None) => SessionState::Unauthenticated,
            Err(e) => {
                warn!("Stored token unreadable, starting logged out: {}", e);
                SessionState::Unauthenticated
            }
        };

        self.state.send_replace(next.clone());
        info!(
            "Session initialized: {}",
            if next.is_authenticated() { "authenticated" } else { "unauthenticated" }
        );
        next
    }

    /// Persist the token, then flip the in-memory state to `Authenticated`.
    ///
    /// If persistence fails the in-memory state is left untouched.
    pub fn login(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(token)?;
        self.state
            .send_replace(SessionState::Authenticated(token.to_string()));
        info!("Session authenticated");
        Ok(())
    }

    /// Clear the stored token, then flip to `Unauthenticated`. Idempotent.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.store.clear()?;
        self.state.send_replace(SessionState::Unauthenticated);
        info!("Session ended");
        Ok(())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The current token, if authenticated.
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    /// Read handle for components reacting to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    fn temp_context(name: &str) -> SessionContext {
        let seq = DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "eko-kampus-session-{}-{}-{}",
            std::process::id(),
            name,
            seq
        ));
        let _ = std::fs::remove_dir_all(&dir);
        SessionContext::new(TokenStore::at(dir))
    }

    /// A store whose directory path is occupied by a plain file, so every
    /// write fails.
    fn broken_context(name: &str) -> SessionContext {
        let seq = DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "eko-kampus-session-broken-{}-{}-{}",
            std::process::id(),
            name,
            seq
        ));
        std::fs::write(&path, b"blocker").unwrap();
        SessionContext::new(TokenStore::at(path.join("store")))
    }

    #[test]
    fn starts_loading() {
        let session = temp_context("loading");
        assert_eq!(session.state(), SessionState::Loading);
    }

    #[test]
    fn fresh_store_settles_unauthenticated() {
        let session = temp_context("fresh");
        assert_eq!(session.initialize(), SessionState::Unauthenticated);
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn login_persists_and_authenticates() {
        let session = temp_context("login");
        session.initialize();
        session.login("tok123").unwrap();

        assert_eq!(session.state(), SessionState::Authenticated("tok123".into()));
        assert_eq!(session.token().as_deref(), Some("tok123"));
    }

    #[test]
    fn persisted_token_survives_restart() {
        let seq = DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "eko-kampus-session-restart-{}-{}",
            std::process::id(),
            seq
        ));
        let _ = std::fs::remove_dir_all(&dir);

        let session = SessionContext::new(TokenStore::at(&dir));
        session.initialize();
        session.login("tok123").unwrap();
        drop(session);

        let revived = SessionContext::new(TokenStore::at(&dir));
        assert_eq!(
            revived.initialize(),
            SessionState::Authenticated("tok123".into())
        );
    }

    #[test]
    fn failed_persistence_leaves_state_unchanged() {
        let session = broken_context("atomic-login");
        session.initialize();

        assert!(session.login("tok123").is_err());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn logout_clears_store_and_state() {
        let session = temp_context("logout");
        session.initialize();
        session.login("tok123").unwrap();

        session.logout().unwrap();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn logout_twice_equals_logout_once() {
        let session = temp_context("idempotent");
        session.initialize();
        session.login("tok123").unwrap();

        session.logout().unwrap();
        session.logout().unwrap();
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn subscribers_observe_the_final_state() {
        let session = temp_context("subscribe");
        let rx = session.subscribe();
        session.initialize();
        session.login("tok123").unwrap();

        assert_eq!(*rx.borrow(), SessionState::Authenticated("tok123".into()));
    }
}
