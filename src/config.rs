//! Application configuration.
//!
//! Everything comes from the environment. Required values (dashboard
//! credentials, spreadsheet identity) are startup-fatal when absent; the
//! rest carry working defaults for local development.

use std::time::Duration;

use serde::Deserialize;

/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "ORDERSYNC_LOG";
/// Environment variable for the HTTP port.
pub const PORT_ENV_VAR: &str = "PORT";
/// Environment variable for the dashboard login email.
pub const DASHBOARD_EMAIL_ENV_VAR: &str = "BLVD_EMAIL";
/// Environment variable for the dashboard login password.
pub const DASHBOARD_PASSWORD_ENV_VAR: &str = "BLVD_PASSWORD";
/// Environment variable for the dashboard base URL.
pub const DASHBOARD_BASE_URL_ENV_VAR: &str = "DASHBOARD_BASE_URL";
/// Environment variable for the dashboard business identifier.
pub const BUSINESS_ID_ENV_VAR: &str = "BLVD_BUSINESS_ID";
/// Environment variable for the dashboard location identifier.
pub const LOCATION_ID_ENV_VAR: &str = "BLVD_LOCATION_ID";
/// Environment variable for the base64-encoded service-account key JSON.
pub const GOOGLE_CREDENTIALS_ENV_VAR: &str = "GOOGLE_CREDENTIALS_B64";
/// Environment variable for the target spreadsheet.
pub const SPREADSHEET_ID_ENV_VAR: &str = "SPREADSHEET_ID";
/// Environment variable for the WebDriver endpoint.
pub const WEBDRIVER_URL_ENV_VAR: &str = "WEBDRIVER_URL";
/// Environment variable for headless browser mode.
pub const HEADLESS_ENV_VAR: &str = "HEADLESS";
/// Environment variable for the persisted browser-session artifact.
pub const SESSION_FILE_ENV_VAR: &str = "SESSION_FILE";
/// Environment variable for the element-wait timeout override (seconds).
pub const ELEMENT_TIMEOUT_ENV_VAR: &str = "ELEMENT_TIMEOUT_SECS";
/// Environment variable for the webhook job queue capacity.
pub const QUEUE_CAPACITY_ENV_VAR: &str = "QUEUE_CAPACITY";

const DEFAULT_DASHBOARD_BASE_URL: &str = "https://dashboard.boulevard.io";
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
const DEFAULT_SESSION_FILE: &str = "session.json";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {var} has invalid value '{value}'")]
    InvalidVar { var: &'static str, value: String },
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Scheduling-dashboard credentials and URLs.
    pub dashboard: DashboardConfig,
    /// Spreadsheet ledger configuration.
    pub sheets: SheetsConfig,
    /// WebDriver endpoint configuration.
    pub driver: DriverConfig,
    /// Element-wait timeout policy, shared by every page interaction.
    pub timeouts: TimeoutConfig,
}

impl Config {
    /// Load the full configuration from the environment.
    ///
    /// Fails fast on any missing required value so a misconfigured deploy
    /// dies at startup rather than per-request.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            dashboard: DashboardConfig::from_env()?,
            sheets: SheetsConfig::from_env()?,
            driver: DriverConfig::from_env()?,
            timeouts: TimeoutConfig::from_env()?,
        })
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Capacity of the pipeline job queue.
    pub queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "0.0.0.0".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(port) = optional_parsed(PORT_ENV_VAR)? {
            config.port = port;
        }
        if let Some(capacity) = optional_parsed(QUEUE_CAPACITY_ENV_VAR)? {
            config.queue_capacity = capacity;
        }
        Ok(config)
    }
}

/// Scheduling-dashboard credentials and page URLs.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Login email.
    pub email: String,
    /// Login password.
    pub password: String,
    /// Base URL of the dashboard.
    pub base_url: String,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            email: required(DASHBOARD_EMAIL_ENV_VAR)?,
            password: required(DASHBOARD_PASSWORD_ENV_VAR)?,
            base_url: optional(DASHBOARD_BASE_URL_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_DASHBOARD_BASE_URL.to_string()),
        })
    }

    pub fn login_url(&self) -> String {
        format!("{}/login-v2", self.base_url.trim_end_matches('/'))
    }

    pub fn home_url(&self) -> String {
        format!("{}/calendar", self.base_url.trim_end_matches('/'))
    }

    pub fn clients_url(&self) -> String {
        format!("{}/clients", self.base_url.trim_end_matches('/'))
    }
}

/// Spreadsheet ledger configuration.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Base64-encoded service-account key JSON.
    pub credentials_b64: String,
    /// Target spreadsheet identifier.
    pub spreadsheet_id: String,
}

impl SheetsConfig {
    /// Load only the spreadsheet configuration.
    ///
    /// The export binary uses this directly so it never demands dashboard
    /// credentials it does not need.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            credentials_b64: required(GOOGLE_CREDENTIALS_ENV_VAR)?,
            spreadsheet_id: required(SPREADSHEET_ID_ENV_VAR)?,
        })
    }
}

/// Calendar API identity.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Business identifier in the dashboard's calendar endpoint path.
    pub business_id: String,
    /// Location the calendar query is scoped to.
    pub location_id: String,
}

impl CalendarConfig {
    /// Load only the calendar configuration.
    ///
    /// The report binary uses this directly; the webhook server never
    /// touches the calendar API.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            business_id: required(BUSINESS_ID_ENV_VAR)?,
            location_id: required(LOCATION_ID_ENV_VAR)?,
        })
    }
}

/// WebDriver endpoint configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// WebDriver server URL (chromedriver).
    pub webdriver_url: String,
    /// Run the browser headless.
    pub headless: bool,
    /// Path of the persisted session artifact.
    pub session_file: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            session_file: DEFAULT_SESSION_FILE.to_string(),
        }
    }
}

impl DriverConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = optional(WEBDRIVER_URL_ENV_VAR) {
            config.webdriver_url = url;
        }
        if let Some(raw) = optional(HEADLESS_ENV_VAR) {
            config.headless = match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: HEADLESS_ENV_VAR,
                        value: raw,
                    })
                }
            };
        }
        if let Some(path) = optional(SESSION_FILE_ENV_VAR) {
            config.session_file = path;
        }
        Ok(config)
    }
}

/// Timeout policy for page interactions.
///
/// Every element wait in the system goes through one of these bounds, so
/// flakiness tuning happens here rather than at each call site.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// Page navigation and first-element appearance.
    pub page_load: Duration,
    /// Post-submit login completion.
    pub login: Duration,
    /// General expected-element waits.
    pub element: Duration,
    /// Short probe for "is this marker present" branching.
    pub probe: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_load: Duration::from_secs(15),
            login: Duration::from_secs(30),
            element: Duration::from_secs(10),
            probe: Duration::from_secs(5),
        }
    }
}

impl TimeoutConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(secs) = optional_parsed::<u64>(ELEMENT_TIMEOUT_ENV_VAR)? {
            config.element = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

fn required(var: &'static str) -> Result<String> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn optional_parsed<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>> {
    match optional(var) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { var, value: raw }),
        None => Ok(None),
    }
}
