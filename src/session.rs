//! Session-artifact stores.
//!
//! `FileSessionStore` persists the cookie jar as JSON on disk, matching the
//! artifact layout the dashboard automation has always used. A corrupt or
//! missing file is treated as "no session"; the caller falls back to a
//! fresh credential login.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::interfaces::{SessionState, SessionStore};

/// File-backed session store.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Option<SessionState> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no session artifact");
                return None;
            }
        };
        match serde_json::from_slice::<SessionState>(&raw) {
            Ok(state) if !state.is_empty() => Some(state),
            Ok(_) => None,
            Err(e) => {
                // Corruption is swallowed; a fresh login replaces the artifact.
                warn!(path = %self.path.display(), error = %e, "session artifact unreadable, ignoring");
                None
            }
        }
    }

    async fn save(&self, state: &SessionState) -> std::io::Result<()> {
        let raw = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&self.path, raw).await
    }
}

/// In-memory session store for tests.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Arc<RwLock<Option<SessionState>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the slot, simulating a session left by an earlier run.
    pub async fn seed(&self, state: SessionState) {
        *self.slot.write().await = Some(state);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Option<SessionState> {
        self.slot.read().await.clone()
    }

    async fn save(&self, state: &SessionState) -> std::io::Result<()> {
        *self.slot.write().await = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str) -> serde_json::Value {
        serde_json::json!({ "name": name, "value": "v", "domain": ".example.io" })
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert!(store.load().await.is_none());

        let state = SessionState {
            cookies: vec![cookie("_session")],
        };
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await, Some(state));
    }

    #[tokio::test]
    async fn test_file_store_overwrites_prior_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        store
            .save(&SessionState {
                cookies: vec![cookie("old")],
            })
            .await
            .unwrap();
        let newer = SessionState {
            cookies: vec![cookie("new")],
        };
        store.save(&newer).await.unwrap();
        assert_eq!(store.load().await, Some(newer));
    }

    #[tokio::test]
    async fn test_file_store_swallows_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileSessionStore::new(&path);
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_state_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&SessionState::default()).await.unwrap();
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.load().await.is_none());
        let state = SessionState {
            cookies: vec![cookie("_session")],
        };
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await, Some(state));
    }
}
