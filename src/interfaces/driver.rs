//! Browser-driving interface.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors that can occur while driving the browser.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("browser could not be started: {0}")]
    Launch(String),

    #[error("element '{selector}' did not appear within {timeout:?}")]
    ElementTimeout { selector: String, timeout: Duration },

    #[error("webdriver protocol error: {0}")]
    Protocol(String),

    #[error("webdriver transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no active browser session")]
    NoSession,
}

impl DriverError {
    /// Whether this is an element-wait timeout, the one recoverable kind
    /// callers branch on.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::ElementTimeout { .. })
    }
}

/// Serialized browser-session artifact: the cookie jar captured after a
/// successful login, reapplied on later runs to skip the login form.
///
/// The cookie values are opaque to this system; they are stored exactly as
/// the WebDriver endpoint reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: Vec<serde_json::Value>,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Interface for a controllable browser session.
///
/// Implementations:
/// - `WebDriverSession`: real browser via the W3C WebDriver protocol
/// - `MockDriver`: scripted in-memory driver for tests
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Start the browser context if it is not already running. Idempotent.
    async fn launch(&self) -> Result<()>;

    /// Navigate to a URL.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Clear and type into the element matching `selector`.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Click the element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait until an element matching `selector` is present.
    ///
    /// Fails with `ElementTimeout` when the element does not appear within
    /// `timeout`; callers use that signal to branch.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Visible text of the first element matching `selector`, or an empty
    /// string when the element is absent.
    async fn visible_text(&self, selector: &str) -> Result<String>;

    /// Capture the current session state (cookies) for persistence.
    async fn capture_state(&self) -> Result<SessionState>;

    /// Reapply previously captured session state to the running browser.
    async fn apply_state(&self, state: &SessionState) -> Result<()>;

    /// Probe for an element without treating absence as an error.
    async fn is_present(&self, selector: &str, timeout: Duration) -> Result<bool> {
        match self.wait_for(selector, timeout).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
