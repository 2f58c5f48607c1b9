//! Browser-session persistence interface.
//!
//! The session artifact used to be ambient file access; it is a capability
//! so tests can substitute an in-memory store and so a mutual-exclusion
//! guard has somewhere to live if concurrent runs ever need one.

use async_trait::async_trait;

use super::driver::SessionState;

/// Interface for the persisted browser-session artifact.
///
/// Single slot: created on first successful login, read at the start of
/// every run, overwritten after every successful login, never deleted
/// automatically. One writer assumed.
///
/// Implementations:
/// - `FileSessionStore`: JSON artifact on disk
/// - `MemorySessionStore`: in-memory slot for tests
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session, if any.
    ///
    /// A missing or corrupt artifact yields `None` rather than an error; a
    /// fresh login is always the fallback.
    async fn load(&self) -> Option<SessionState>;

    /// Persist the session, overwriting any prior artifact.
    async fn save(&self, state: &SessionState) -> std::io::Result<()>;
}
