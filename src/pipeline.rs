//! Order-processing pipeline.
//!
//! One webhook payload in, exactly one ledger row out. Authentication and
//! client resolution failures never escape this boundary: they become a
//! `failed` status row, because an unrecorded order is silent data loss
//! for the business ledger. The one exception is the ledger write itself
//! failing, which can only be logged.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::auth::{AuthError, AuthSession};
use crate::config::{DashboardConfig, TimeoutConfig};
use crate::interfaces::{DriverSession, SessionStore, SheetStore};
use crate::model::{month_table_name, ClientRecord, OrderPayload, OrderStatus, StatusRow};
use crate::resolver::{ClientResolver, Resolution, ResolveError};
use crate::sheets::schema;

/// Failure of any pipeline step, visible in each step's signature rather
/// than caught blindly at a boundary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Outcome of one pipeline run, published on the worker pool's report
/// channel. Nothing consumes it in production yet; it exists as the seam
/// for future retry or alerting logic.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub contact_id: String,
    pub table: String,
    pub status: OrderStatus,
    pub detail: String,
}

/// Orchestrates auth, client resolution, and the ledger write.
pub struct OrderPipeline {
    driver: Arc<dyn DriverSession>,
    sessions: Arc<dyn SessionStore>,
    sheets: Arc<dyn SheetStore>,
    dashboard: DashboardConfig,
    timeouts: TimeoutConfig,
}

impl OrderPipeline {
    pub fn new(
        driver: Arc<dyn DriverSession>,
        sessions: Arc<dyn SessionStore>,
        sheets: Arc<dyn SheetStore>,
        dashboard: DashboardConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            driver,
            sessions,
            sheets,
            dashboard,
            timeouts,
        }
    }

    /// Process one order end to end.
    ///
    /// Guarantee: exactly one status row is appended per invocation,
    /// whichever step failed (ledger availability permitting).
    pub async fn process(&self, payload: OrderPayload) -> PipelineReport {
        let table = month_table_name(payload.created_on_date(), Utc::now().date_naive());
        info!(
            contact_id = %payload.contact_id,
            table,
            "pipeline run started"
        );

        let (status, detail) = match self.run_steps(&payload).await {
            Ok(resolution) => (OrderStatus::Completed, resolution.describe().to_string()),
            Err(e) => {
                warn!(contact_id = %payload.contact_id, error = %e, "pipeline step failed");
                (OrderStatus::Failed, e.to_string())
            }
        };

        let row = StatusRow::new(&payload, status, Utc::now());
        if let Err(e) = self.append_status(table, &row).await {
            // Last step, no further fallback: the disposition is lost from
            // the ledger and survives only in the log.
            error!(
                contact_id = %payload.contact_id,
                table,
                status = status.as_str(),
                error = %e,
                "ledger write failed, order outcome unrecorded"
            );
        }

        info!(
            contact_id = %payload.contact_id,
            table,
            status = status.as_str(),
            detail = %detail,
            "pipeline run finished"
        );
        PipelineReport {
            contact_id: payload.contact_id.clone(),
            table: table.to_string(),
            status,
            detail,
        }
    }

    async fn run_steps(&self, payload: &OrderPayload) -> Result<Resolution, PipelineError> {
        let auth = AuthSession::new(
            self.driver.as_ref(),
            self.sessions.as_ref(),
            &self.dashboard,
            &self.timeouts,
        );
        auth.authenticate().await?;

        let client = ClientRecord::from_payload(payload);
        let resolver = ClientResolver::new(
            self.driver.as_ref(),
            self.dashboard.clients_url(),
            &self.timeouts,
        );
        let resolution = resolver.resolve_or_create(&client).await?;
        Ok(resolution)
    }

    async fn append_status(
        &self,
        table: &str,
        row: &StatusRow,
    ) -> Result<(), crate::interfaces::StoreError> {
        let handle = self
            .sheets
            .ensure_table(table, &schema::ORDER_LEDGER_HEADER)
            .await?;
        self.sheets
            .append_row(&handle, schema::status_row_cells(row))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AUTHENTICATED_MARKER_SELECTOR, LOGIN_EMAIL_SELECTOR};
    use crate::resolver::{
        CLIENT_ROW_SELECTOR, CREATE_CONFIRMATION_SELECTOR, FORM_FIRST_NAME_SELECTOR,
        SEARCH_INPUT_SELECTOR,
    };
    use crate::session::MemorySessionStore;
    use crate::test_utils::{MockDriver, MockSheetStore};

    fn payload() -> OrderPayload {
        OrderPayload {
            contact_id: "C-77".to_string(),
            first_name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            created_on: "2025-10-31T09:30:00-05:00".to_string(),
            ..Default::default()
        }
    }

    fn pipeline(driver: Arc<MockDriver>, sheets: Arc<MockSheetStore>) -> OrderPipeline {
        OrderPipeline::new(
            driver,
            Arc::new(MemorySessionStore::new()),
            sheets,
            DashboardConfig {
                email: "ops@example.com".to_string(),
                password: "secret".to_string(),
                base_url: "https://dashboard.example.io".to_string(),
            },
            TimeoutConfig::default(),
        )
    }

    async fn login_ready(driver: &MockDriver) {
        driver.set_present(LOGIN_EMAIL_SELECTOR, true).await;
        driver.set_present(AUTHENTICATED_MARKER_SELECTOR, true).await;
    }

    #[tokio::test]
    async fn test_completed_run_appends_exactly_one_row() {
        let driver = Arc::new(MockDriver::new());
        login_ready(&driver).await;
        driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
        driver.set_present(CLIENT_ROW_SELECTOR, true).await;
        driver.set_text(CLIENT_ROW_SELECTOR, "Dana").await;
        let sheets = Arc::new(MockSheetStore::new());

        let report = pipeline(driver, sheets.clone()).process(payload()).await;
        assert_eq!(report.status, OrderStatus::Completed);
        // 2025-10-31 minus one day stays in October.
        assert_eq!(report.table, "October");
        assert_eq!(sheets.row_count("October").await, 1);
        let rows = sheets.rows("October").await;
        assert_eq!(rows[0][0], "C-77");
        assert_eq!(rows[0][15], "completed");
    }

    #[tokio::test]
    async fn test_login_failure_records_failed_row_and_skips_resolution() {
        let driver = Arc::new(MockDriver::new());
        driver.set_present(LOGIN_EMAIL_SELECTOR, true).await;
        // Authenticated marker never appears: login fails.
        let sheets = Arc::new(MockSheetStore::new());

        let report = pipeline(driver.clone(), sheets.clone())
            .process(payload())
            .await;
        assert_eq!(report.status, OrderStatus::Failed);
        assert!(report.detail.contains("login failed"));
        assert_eq!(sheets.row_count("October").await, 1);
        // The client list was never touched.
        assert_eq!(driver.fill_count(SEARCH_INPUT_SELECTOR).await, 0);
    }

    #[tokio::test]
    async fn test_resolution_failure_records_failed_row() {
        let driver = Arc::new(MockDriver::new());
        login_ready(&driver).await;
        // Search box missing: UiState failure inside resolution.
        let sheets = Arc::new(MockSheetStore::new());

        let report = pipeline(driver, sheets.clone()).process(payload()).await;
        assert_eq!(report.status, OrderStatus::Failed);
        assert!(report.detail.contains("unexpected dashboard state"));
        assert_eq!(sheets.row_count("October").await, 1);
    }

    #[tokio::test]
    async fn test_creation_path_marks_completed() {
        let driver = Arc::new(MockDriver::new());
        login_ready(&driver).await;
        driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
        driver.set_present(FORM_FIRST_NAME_SELECTOR, true).await;
        driver.set_present(CREATE_CONFIRMATION_SELECTOR, true).await;
        let sheets = Arc::new(MockSheetStore::new());

        let report = pipeline(driver, sheets.clone()).process(payload()).await;
        assert_eq!(report.status, OrderStatus::Completed);
        assert_eq!(report.detail, "client created");
        assert_eq!(sheets.row_count("October").await, 1);
    }

    #[tokio::test]
    async fn test_ledger_outage_still_returns_report() {
        let driver = Arc::new(MockDriver::new());
        login_ready(&driver).await;
        driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
        driver.set_present(CLIENT_ROW_SELECTOR, true).await;
        driver.set_text(CLIENT_ROW_SELECTOR, "Dana").await;
        let sheets = Arc::new(MockSheetStore::new());
        sheets.set_fail_on_append(true).await;

        let report = pipeline(driver, sheets.clone()).process(payload()).await;
        // Status is computed from the steps; only the recording was lost.
        assert_eq!(report.status, OrderStatus::Completed);
        assert_eq!(sheets.row_count("October").await, 0);
    }

    #[tokio::test]
    async fn test_browser_launch_failure_records_failed_row() {
        let driver = Arc::new(MockDriver::new());
        driver.set_fail_launch(true).await;
        let sheets = Arc::new(MockSheetStore::new());

        let report = pipeline(driver, sheets.clone()).process(payload()).await;
        assert_eq!(report.status, OrderStatus::Failed);
        assert!(report.detail.contains("browser could not be started"));
        assert_eq!(sheets.row_count("October").await, 1);
    }

    #[tokio::test]
    async fn test_missing_created_on_routes_to_current_month() {
        let driver = Arc::new(MockDriver::new());
        login_ready(&driver).await;
        driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
        driver.set_present(CLIENT_ROW_SELECTOR, true).await;
        driver.set_text(CLIENT_ROW_SELECTOR, "Dana").await;
        let sheets = Arc::new(MockSheetStore::new());

        let mut p = payload();
        p.created_on = String::new();
        let report = pipeline(driver, sheets.clone()).process(p).await;
        let expected =
            month_table_name(None, Utc::now().date_naive());
        assert_eq!(report.table, expected);
        assert_eq!(sheets.row_count(expected).await, 1);
    }
}
