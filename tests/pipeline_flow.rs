//! End-to-end pipeline behavior against mock capabilities.

use std::sync::Arc;

use ordersync::auth::{AUTHENTICATED_MARKER_SELECTOR, LOGIN_EMAIL_SELECTOR};
use ordersync::config::{DashboardConfig, TimeoutConfig};
use ordersync::interfaces::SessionStore;
use ordersync::model::{OrderPayload, OrderStatus};
use ordersync::pipeline::OrderPipeline;
use ordersync::resolver::{CLIENT_ROW_SELECTOR, SEARCH_INPUT_SELECTOR};
use ordersync::session::MemorySessionStore;
use ordersync::test_utils::{MockDriver, MockSheetStore};

fn dashboard() -> DashboardConfig {
    DashboardConfig {
        email: "ops@example.com".to_string(),
        password: "secret".to_string(),
        base_url: "https://dashboard.example.io".to_string(),
    }
}

fn payload(contact_id: &str, created_on: &str) -> OrderPayload {
    OrderPayload {
        contact_id: contact_id.to_string(),
        first_name: "Dana".to_string(),
        email: "dana@example.com".to_string(),
        created_on: created_on.to_string(),
        ..Default::default()
    }
}

async fn scripted_driver() -> Arc<MockDriver> {
    let driver = Arc::new(MockDriver::new());
    driver.set_present(LOGIN_EMAIL_SELECTOR, true).await;
    driver.set_present(AUTHENTICATED_MARKER_SELECTOR, true).await;
    driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
    driver.set_present(CLIENT_ROW_SELECTOR, true).await;
    driver.set_text(CLIENT_ROW_SELECTOR, "Dana").await;
    driver
}

#[tokio::test]
async fn second_run_reuses_persisted_session() {
    let driver = scripted_driver().await;
    let sessions = Arc::new(MemorySessionStore::new());
    let sheets = Arc::new(MockSheetStore::new());
    let pipeline = OrderPipeline::new(
        driver.clone(),
        sessions.clone(),
        sheets.clone(),
        dashboard(),
        TimeoutConfig::default(),
    );

    // First run: no artifact, so credentials are submitted and persisted.
    let report = pipeline.process(payload("C-1", "2025-10-15")).await;
    assert_eq!(report.status, OrderStatus::Completed);
    assert_eq!(driver.fill_count(LOGIN_EMAIL_SELECTOR).await, 1);
    assert!(sessions.load().await.is_some());

    // Second run: the stored session short-circuits the login form.
    let report = pipeline.process(payload("C-2", "2025-10-16")).await;
    assert_eq!(report.status, OrderStatus::Completed);
    assert_eq!(driver.fill_count(LOGIN_EMAIL_SELECTOR).await, 1);
    assert!(driver.applied_state().await.is_some());

    // One row per run, both in October.
    assert_eq!(sheets.row_count("October").await, 2);
}

#[tokio::test]
async fn authenticated_browser_without_artifact_still_completes() {
    // A browser kept warm across runs (or a deleted session.json) skips
    // the login form entirely; the run must not be recorded as failed.
    let driver = Arc::new(MockDriver::new());
    driver.set_present(AUTHENTICATED_MARKER_SELECTOR, true).await;
    driver.set_present(SEARCH_INPUT_SELECTOR, true).await;
    driver.set_present(CLIENT_ROW_SELECTOR, true).await;
    driver.set_text(CLIENT_ROW_SELECTOR, "Dana").await;
    let sheets = Arc::new(MockSheetStore::new());
    let pipeline = OrderPipeline::new(
        driver.clone(),
        Arc::new(MemorySessionStore::new()),
        sheets.clone(),
        dashboard(),
        TimeoutConfig::default(),
    );

    let report = pipeline.process(payload("C-6", "2025-10-15")).await;
    assert_eq!(report.status, OrderStatus::Completed);
    assert_eq!(driver.fill_count(LOGIN_EMAIL_SELECTOR).await, 0);
    let rows = sheets.rows("October").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][15], "completed");
}

#[tokio::test]
async fn month_boundary_payload_files_under_previous_month() {
    let driver = scripted_driver().await;
    let sheets = Arc::new(MockSheetStore::new());
    let pipeline = OrderPipeline::new(
        driver,
        Arc::new(MemorySessionStore::new()),
        sheets.clone(),
        dashboard(),
        TimeoutConfig::default(),
    );

    let report = pipeline
        .process(payload("C-3", "2025-11-01T00:30:00-05:00"))
        .await;
    assert_eq!(report.table, "October");
    assert_eq!(sheets.row_count("October").await, 1);
    assert_eq!(sheets.row_count("November").await, 0);
}

#[tokio::test]
async fn failed_and_completed_runs_share_one_table() {
    let driver = scripted_driver().await;
    let sheets = Arc::new(MockSheetStore::new());
    let pipeline = OrderPipeline::new(
        driver.clone(),
        Arc::new(MemorySessionStore::new()),
        sheets.clone(),
        dashboard(),
        TimeoutConfig::default(),
    );

    let ok = pipeline.process(payload("C-4", "2025-10-20")).await;
    assert_eq!(ok.status, OrderStatus::Completed);

    // Break the client list for the next run.
    driver.set_present(SEARCH_INPUT_SELECTOR, false).await;
    let failed = pipeline.process(payload("C-5", "2025-10-21")).await;
    assert_eq!(failed.status, OrderStatus::Failed);

    let rows = sheets.rows("October").await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][15], "completed");
    assert_eq!(rows[1][15], "failed");
}
