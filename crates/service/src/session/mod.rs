//! Client-side session state as an explicit object.
//!
//! Replaces the original global provider with a value that is constructed,
//! initialized once, and injected into whatever consumes it. The lifecycle
//! is Loading until `initialize` completes, then Ready for good; consumers
//! can gate on `is_loading` deterministically.

pub mod store;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth::domain::AuthUser;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(String),
}

/// Token and user persisted together under fixed keys; they are only ever
/// written and cleared as a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loading,
    Ready,
}

struct State {
    phase: Phase,
    current: Option<PersistedSession>,
}

/// Current identity plus authentication flag, backed by a pluggable
/// persisted store so state survives restarts.
pub struct Session {
    store: Arc<dyn SessionStore>,
    state: RwLock<State>,
}

impl Session {
    /// A fresh session starts in the Loading phase, unauthenticated.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store, state: RwLock::new(State { phase: Phase::Loading, current: None }) }
    }

    /// One-shot startup check: read the persisted pair and leave Loading.
    /// The phase flips to Ready exactly once, whether the read succeeds,
    /// finds nothing, or fails; repeated calls are no-ops.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        if state.phase == Phase::Ready {
            return Ok(());
        }
        let loaded = self.store.load().await;
        state.phase = Phase::Ready;
        match loaded {
            Ok(persisted) => {
                state.current = persisted;
                Ok(())
            }
            Err(e) => {
                state.current = None;
                Err(e)
            }
        }
    }

    /// Record a successful login: persist token and user, mark authenticated.
    pub async fn login(&self, user: AuthUser, token: String) -> Result<(), SessionError> {
        let persisted = PersistedSession { token, user };
        self.store.save(&persisted).await?;
        let mut state = self.state.write().await;
        state.phase = Phase::Ready;
        state.current = Some(persisted);
        Ok(())
    }

    /// Discard the credential client-side; the server keeps no session to
    /// invalidate.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.store.clear().await?;
        let mut state = self.state.write().await;
        state.current = None;
        Ok(())
    }

    /// Clear state after the server rejected the credential. Storage
    /// failures are logged, not surfaced; the in-memory flags always reset.
    pub async fn invalidate(&self) {
        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        let mut state = self.state.write().await;
        state.current = None;
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.phase == Phase::Loading
    }

    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.phase == Phase::Ready && state.current.is_some()
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.state.read().await.current.as_ref().map(|p| p.user.clone())
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.current.as_ref().map(|p| p.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_user() -> AuthUser {
        let now = Utc::now().into();
        AuthUser {
            id: Uuid::new_v4(),
            username: "ana".into(),
            email: "ana@example.com".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn loading_flips_exactly_once() {
        let session = Session::new(Arc::new(MemorySessionStore::default()));
        assert!(session.is_loading().await);
        assert!(!session.is_authenticated().await);

        session.initialize().await.unwrap();
        assert!(!session.is_loading().await);
        assert!(!session.is_authenticated().await);

        // Second initialize is a no-op
        session.initialize().await.unwrap();
        assert!(!session.is_loading().await);
    }

    #[tokio::test]
    async fn login_persists_and_survives_restart() {
        let store = Arc::new(MemorySessionStore::default());

        let session = Session::new(store.clone());
        session.initialize().await.unwrap();
        let user = sample_user();
        session.login(user.clone(), "tok-123".into()).await.unwrap();
        assert!(session.is_authenticated().await);
        assert_eq!(session.token().await.as_deref(), Some("tok-123"));

        // A new session over the same store picks the identity back up
        let restarted = Session::new(store);
        restarted.initialize().await.unwrap();
        assert!(restarted.is_authenticated().await);
        assert_eq!(restarted.current_user().await, Some(user));
    }

    #[tokio::test]
    async fn logout_clears_both_token_and_user() {
        let store = Arc::new(MemorySessionStore::default());
        let session = Session::new(store.clone());
        session.initialize().await.unwrap();
        session.login(sample_user(), "tok".into()).await.unwrap();

        session.logout().await.unwrap();
        assert!(!session.is_authenticated().await);
        assert!(session.token().await.is_none());
        assert!(session.current_user().await.is_none());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_rejection_invalidates_session() {
        let session = Session::new(Arc::new(MemorySessionStore::default()));
        session.initialize().await.unwrap();
        session.login(sample_user(), "tok".into()).await.unwrap();

        session.invalidate().await;
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn file_store_round_trips() {
        let path = std::env::temp_dir().join(format!("book_session_{}.json", Uuid::new_v4()));
        let store = Arc::new(FileSessionStore::new(&path));

        let session = Session::new(store.clone());
        session.initialize().await.unwrap();
        let user = sample_user();
        session.login(user.clone(), "tok-file".into()).await.unwrap();

        let reloaded = Session::new(store);
        reloaded.initialize().await.unwrap();
        assert_eq!(reloaded.current_user().await, Some(user));
        assert_eq!(reloaded.token().await.as_deref(), Some("tok-file"));

        reloaded.logout().await.unwrap();
        assert!(tokio::fs::metadata(&path).await.is_err());
    }
}
