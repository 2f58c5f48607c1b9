//! Client lookup and creation against the dashboard UI.
//!
//! Search is name-substring based because the CRM frequently supplies only
//! a first name; over-matching on common names is a known precision limit.
//! An element timeout on the search UI itself is an unexpected page state,
//! never "client not found".

use tracing::{debug, info};

use crate::config::TimeoutConfig;
use crate::interfaces::{DriverError, DriverSession};
use crate::model::ClientRecord;

/// Client list search box.
pub const SEARCH_INPUT_SELECTOR: &str = "input[placeholder='Search clients']";
/// A client row in the filtered list.
pub const CLIENT_ROW_SELECTOR: &str = "[data-test='client-row']";
/// Button opening the creation form.
pub const NEW_CLIENT_BUTTON_SELECTOR: &str = "button[data-test='new-client']";
/// Creation form fields.
pub const FORM_FIRST_NAME_SELECTOR: &str = "input[name='first_name']";
pub const FORM_LAST_NAME_SELECTOR: &str = "input[name='last_name']";
pub const FORM_EMAIL_SELECTOR: &str = "input[name='email']";
pub const FORM_PHONE_SELECTOR: &str = "input[name='phone']";
pub const FORM_ADDRESS_SELECTOR: &str = "input[name='address']";
/// Creation form submit button.
pub const FORM_SUBMIT_SELECTOR: &str = "button[data-test='save-client']";
/// Toast shown once the client is saved.
pub const CREATE_CONFIRMATION_SELECTOR: &str = "[data-test='client-created']";
/// Inline validation message on the creation form.
pub const FORM_ERROR_SELECTOR: &str = ".form-error, [role='alert']";

/// Result type for client resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors that can occur during client resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The page was not in the state the flow expects. Callers must never
    /// infer success or "not found" from this.
    #[error("unexpected dashboard state: {0}")]
    UiState(String),

    /// Creation was submitted but never confirmed.
    #[error("client creation not confirmed: {0}")]
    CreationFailed(String),

    #[error(transparent)]
    Driver(DriverError),
}

/// Final disposition of a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub existed: bool,
    pub created: bool,
}

impl Resolution {
    pub fn describe(&self) -> &'static str {
        if self.existed {
            "client already existed"
        } else {
            "client created"
        }
    }
}

/// Resolves a client by UI search, creating the record when absent.
pub struct ClientResolver<'a> {
    driver: &'a dyn DriverSession,
    clients_url: String,
    timeouts: &'a TimeoutConfig,
}

impl<'a> ClientResolver<'a> {
    pub fn new(driver: &'a dyn DriverSession, clients_url: String, timeouts: &'a TimeoutConfig) -> Self {
        Self {
            driver,
            clients_url,
            timeouts,
        }
    }

    /// Determine whether `client` exists, creating it when not.
    pub async fn resolve_or_create(&self, client: &ClientRecord) -> Result<Resolution> {
        self.driver
            .goto(&self.clients_url)
            .await
            .map_err(ResolveError::Driver)?;

        // The search box is a precondition, so its absence is an
        // unexpected state rather than a lookup miss.
        match self
            .driver
            .wait_for(SEARCH_INPUT_SELECTOR, self.timeouts.page_load)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                return Err(ResolveError::UiState(format!(
                    "client search box never appeared: {e}"
                )))
            }
            Err(e) => return Err(ResolveError::Driver(e)),
        }

        self.driver
            .fill(SEARCH_INPUT_SELECTOR, &client.name)
            .await
            .map_err(ResolveError::Driver)?;

        if self.matching_row_present(client).await? {
            info!(client = %client.name, "client already present, no creation");
            return Ok(Resolution {
                existed: true,
                created: false,
            });
        }

        self.create(client).await?;
        Ok(Resolution {
            existed: false,
            created: true,
        })
    }

    /// Whether the filtered list shows a row matching the client's name.
    ///
    /// Timeout here means "no search results", the one place where absence
    /// is an answer instead of an error.
    async fn matching_row_present(&self, client: &ClientRecord) -> Result<bool> {
        match self
            .driver
            .wait_for(CLIENT_ROW_SELECTOR, self.timeouts.probe)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                debug!(client = %client.name, "search returned no rows");
                return Ok(false);
            }
            Err(e) => return Err(ResolveError::Driver(e)),
        }
        let row_text = self
            .driver
            .visible_text(CLIENT_ROW_SELECTOR)
            .await
            .map_err(ResolveError::Driver)?;
        Ok(row_text
            .to_lowercase()
            .contains(&client.name.to_lowercase()))
    }

    async fn create(&self, client: &ClientRecord) -> Result<()> {
        self.driver
            .click(NEW_CLIENT_BUTTON_SELECTOR)
            .await
            .map_err(|e| ResolveError::UiState(format!("new-client button unusable: {e}")))?;
        match self
            .driver
            .wait_for(FORM_FIRST_NAME_SELECTOR, self.timeouts.element)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                return Err(ResolveError::UiState(format!(
                    "creation form never appeared: {e}"
                )))
            }
            Err(e) => return Err(ResolveError::Driver(e)),
        }

        let (first, last) = client.split_name();
        self.fill_form(FORM_FIRST_NAME_SELECTOR, first).await?;
        self.fill_form(FORM_LAST_NAME_SELECTOR, last).await?;
        self.fill_form(FORM_EMAIL_SELECTOR, &client.email).await?;
        self.fill_form(FORM_PHONE_SELECTOR, &client.phone).await?;
        self.fill_form(FORM_ADDRESS_SELECTOR, &client.address)
            .await?;
        self.driver
            .click(FORM_SUBMIT_SELECTOR)
            .await
            .map_err(|e| ResolveError::UiState(format!("creation form submit unusable: {e}")))?;

        match self
            .driver
            .wait_for(CREATE_CONFIRMATION_SELECTOR, self.timeouts.element)
            .await
        {
            Ok(()) => {
                info!(client = %client.name, "client created");
                Ok(())
            }
            Err(e) if e.is_timeout() => {
                let validation = self
                    .driver
                    .visible_text(FORM_ERROR_SELECTOR)
                    .await
                    .unwrap_or_default();
                let detail = if validation.trim().is_empty() {
                    "confirmation marker never appeared".to_string()
                } else {
                    validation.trim().to_string()
                };
                Err(ResolveError::CreationFailed(detail))
            }
            Err(e) => Err(ResolveError::Driver(e)),
        }
    }

    async fn fill_form(&self, selector: &str, value: &str) -> Result<()> {
        self.driver
            .fill(selector, value)
            .await
            .map_err(|e| ResolveError::UiState(format!("form field {selector} unusable: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;
    use crate::test_utils::MockDriver;

    fn client() -> ClientRecord {
        ClientRecord {
            name: "Dana Reyes".to_string(),
            email: "dana@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "12 Main St".to_string(),
        }
    }

    fn resolver<'a>(driver: &'a MockDriver, timeouts: &'a TimeoutConfig) -> ClientResolver<'a> {
        ClientResolver::new(
            driver,
            "https://dashboard.example.io/clients".to_string(),
            timeouts,
        )
    }

    #[tokio::test]
    async fn test_existing_client_skips_creation() {
        let driver = MockDriver::new();
        driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
        driver.set_present(CLIENT_ROW_SELECTOR, true).await;
        driver.set_text(CLIENT_ROW_SELECTOR, "Dana Reyes — dana@example.com").await;

        let timeouts = TimeoutConfig::default();
        let resolution = resolver(&driver, &timeouts)
            .resolve_or_create(&client())
            .await
            .unwrap();
        assert!(resolution.existed);
        assert!(!resolution.created);
        assert_eq!(driver.click_count(FORM_SUBMIT_SELECTOR).await, 0);
        assert_eq!(driver.fill_count(FORM_FIRST_NAME_SELECTOR).await, 0);
    }

    #[tokio::test]
    async fn test_absent_client_is_created() {
        let driver = MockDriver::new();
        driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
        driver.set_present(FORM_FIRST_NAME_SELECTOR, true).await;
        driver.set_present(CREATE_CONFIRMATION_SELECTOR, true).await;

        let timeouts = TimeoutConfig::default();
        let resolution = resolver(&driver, &timeouts)
            .resolve_or_create(&client())
            .await
            .unwrap();
        assert!(!resolution.existed);
        assert!(resolution.created);
        assert_eq!(driver.fill_count(FORM_FIRST_NAME_SELECTOR).await, 1);
        assert_eq!(driver.fill_count(FORM_EMAIL_SELECTOR).await, 1);
        assert_eq!(driver.click_count(FORM_SUBMIT_SELECTOR).await, 1);
    }

    #[tokio::test]
    async fn test_non_matching_row_still_creates() {
        let driver = MockDriver::new();
        driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
        driver.set_present(CLIENT_ROW_SELECTOR, true).await;
        driver.set_text(CLIENT_ROW_SELECTOR, "Morgan Field").await;
        driver.set_present(FORM_FIRST_NAME_SELECTOR, true).await;
        driver.set_present(CREATE_CONFIRMATION_SELECTOR, true).await;

        let timeouts = TimeoutConfig::default();
        let resolution = resolver(&driver, &timeouts)
            .resolve_or_create(&client())
            .await
            .unwrap();
        assert!(resolution.created);
    }

    #[tokio::test]
    async fn test_missing_search_box_is_ui_state_not_absent_client() {
        let driver = MockDriver::new();
        // Nothing present at all: the search box itself times out.
        let timeouts = TimeoutConfig::default();
        let err = resolver(&driver, &timeouts)
            .resolve_or_create(&client())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UiState(_)));
        assert_eq!(driver.click_count(NEW_CLIENT_BUTTON_SELECTOR).await, 0);
    }

    #[tokio::test]
    async fn test_unconfirmed_creation_reports_validation_text() {
        let driver = MockDriver::new();
        driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
        driver.set_present(FORM_FIRST_NAME_SELECTOR, true).await;
        driver.set_text(FORM_ERROR_SELECTOR, "Phone number is invalid").await;

        let timeouts = TimeoutConfig::default();
        let err = resolver(&driver, &timeouts)
            .resolve_or_create(&client())
            .await
            .unwrap_err();
        assert!(
            matches!(err, ResolveError::CreationFailed(ref detail) if detail == "Phone number is invalid")
        );
    }
}
