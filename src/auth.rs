//! Dashboard authentication.
//!
//! State machine: NoSession → SessionLoaded → LoginAttempted →
//! Authenticated | LoginFailed. A stored session is tried first; when the
//! dashboard already shows the authenticated marker no credentials are
//! submitted at all. Two-factor challenges are unsupported and collapse
//! into `LoginFailed`.

use tracing::{info, warn};

use crate::config::{DashboardConfig, TimeoutConfig};
use crate::interfaces::{DriverError, DriverSession, SessionStore};

/// Login form email field.
pub const LOGIN_EMAIL_SELECTOR: &str = "input[name='email']";
/// Login form password field.
pub const LOGIN_PASSWORD_SELECTOR: &str = "input[name='password']";
/// Login form submit button.
pub const LOGIN_SUBMIT_SELECTOR: &str = "button[type='submit']";
/// Element present only on authenticated pages.
pub const AUTHENTICATED_MARKER_SELECTOR: &str = "horizontal-menu";
/// Visible login error banner.
pub const LOGIN_ERROR_SELECTOR: &str = "[role='alert'], .login-error";
/// One-time-code prompt shown when the account has 2FA enabled.
pub const TWO_FACTOR_SELECTOR: &str = "input[name='otp'], input[autocomplete='one-time-code']";

/// Result type for authentication.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while establishing a dashboard session.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credentials rejected, post-login marker absent, or a 2FA prompt.
    /// The caller cannot distinguish the specific cause.
    #[error("login failed: {reason}")]
    LoginFailed { reason: String },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Authentication progress, observable for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoSession,
    SessionLoaded,
    LoginAttempted,
    Authenticated,
    LoginFailed,
}

/// Establishes or reuses an authenticated dashboard session.
pub struct AuthSession<'a> {
    driver: &'a dyn DriverSession,
    sessions: &'a dyn SessionStore,
    dashboard: &'a DashboardConfig,
    timeouts: &'a TimeoutConfig,
}

/// How the authenticated state was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authenticated {
    /// Stored session was still valid; no credentials were submitted.
    Reused,
    /// Fresh credential login; new session state persisted.
    FreshLogin,
}

impl<'a> AuthSession<'a> {
    pub fn new(
        driver: &'a dyn DriverSession,
        sessions: &'a dyn SessionStore,
        dashboard: &'a DashboardConfig,
        timeouts: &'a TimeoutConfig,
    ) -> Self {
        Self {
            driver,
            sessions,
            dashboard,
            timeouts,
        }
    }

    /// Drive the state machine to `Authenticated` or fail with `LoginFailed`.
    pub async fn authenticate(&self) -> Result<Authenticated> {
        self.driver.launch().await?;

        if let Some(stored) = self.sessions.load().await {
            tracing::debug!(state = ?AuthState::SessionLoaded, "stored session artifact found");
            // Cookies attach only on the dashboard origin, so navigate
            // there before applying, then reload with the session in place.
            self.driver.goto(&self.dashboard.home_url()).await?;
            self.driver.apply_state(&stored).await?;
            self.driver.goto(&self.dashboard.home_url()).await?;
            if self
                .driver
                .is_present(AUTHENTICATED_MARKER_SELECTOR, self.timeouts.probe)
                .await?
            {
                info!(state = ?AuthState::Authenticated, "stored session still valid, login skipped");
                return Ok(Authenticated::Reused);
            }
            info!("stored session expired, falling back to credential login");
        } else {
            tracing::debug!(state = ?AuthState::NoSession, "no stored session artifact");
        }

        self.fresh_login().await
    }

    async fn fresh_login(&self) -> Result<Authenticated> {
        tracing::debug!(state = ?AuthState::LoginAttempted, "attempting credential login");
        self.driver.goto(&self.dashboard.login_url()).await?;
        match self
            .driver
            .wait_for(LOGIN_EMAIL_SELECTOR, self.timeouts.page_load)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                // The dashboard redirects an already-authenticated browser
                // away from the login page, so a missing form can mean the
                // session is live even without a stored artifact.
                if self
                    .driver
                    .is_present(AUTHENTICATED_MARKER_SELECTOR, self.timeouts.probe)
                    .await?
                {
                    info!(state = ?AuthState::Authenticated, "browser already authenticated, login form skipped");
                    return Ok(Authenticated::Reused);
                }
                return Err(AuthError::LoginFailed {
                    reason: "login form never appeared".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        self.driver
            .fill(LOGIN_EMAIL_SELECTOR, &self.dashboard.email)
            .await?;
        self.driver
            .fill(LOGIN_PASSWORD_SELECTOR, &self.dashboard.password)
            .await?;
        self.driver.click(LOGIN_SUBMIT_SELECTOR).await?;

        match self
            .driver
            .wait_for(AUTHENTICATED_MARKER_SELECTOR, self.timeouts.login)
            .await
        {
            Ok(()) => {
                let state = self.driver.capture_state().await?;
                if let Err(e) = self.sessions.save(&state).await {
                    // Non-fatal: the run proceeds, the next run logs in again.
                    warn!(error = %e, "could not persist session artifact");
                }
                info!(state = ?AuthState::Authenticated, "credential login succeeded, session persisted");
                Ok(Authenticated::FreshLogin)
            }
            Err(e) if e.is_timeout() => {
                let err = self.diagnose_login_failure().await;
                warn!(state = ?AuthState::LoginFailed, error = %err, "credential login failed");
                Err(err)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Post-login marker never appeared: capture whatever the page says.
    async fn diagnose_login_failure(&self) -> AuthError {
        if let Ok(true) = self
            .driver
            .is_present(TWO_FACTOR_SELECTOR, self.timeouts.probe)
            .await
        {
            return AuthError::LoginFailed {
                reason: "two-factor challenge presented (unsupported)".to_string(),
            };
        }
        let page_error = self
            .driver
            .visible_text(LOGIN_ERROR_SELECTOR)
            .await
            .unwrap_or_default();
        let reason = if page_error.trim().is_empty() {
            "dashboard never showed the authenticated view".to_string()
        } else {
            page_error.trim().to_string()
        };
        AuthError::LoginFailed { reason }
    }
}
