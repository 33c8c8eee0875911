use std::path::PathBuf;

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};

use super::{PersistedSession, SessionError};

/// Persistence behind the client session: one record, saved and cleared
/// atomically as a unit.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError>;
    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

/// JSON file-backed store. A missing or unreadable file reads as "no
/// session"; clearing removes the file.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).ok()),
            Err(_) => Ok(None),
        }
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.ok();
        }
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        fs::write(&self.path, bytes)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Storage(e.to_string())),
        }
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<Option<PersistedSession>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        *self.inner.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        *self.inner.write().await = None;
        Ok(())
    }
}
