//! ordersync-server: webhook intake service.
//!
//! Receives CRM order webhooks, ensures the client exists in the
//! scheduling dashboard via browser automation, and records each order's
//! outcome in the monthly spreadsheet ledger.
//!
//! ## Configuration
//! - BLVD_EMAIL / BLVD_PASSWORD: dashboard credentials (required)
//! - GOOGLE_CREDENTIALS_B64: base64 service-account key JSON (required)
//! - SPREADSHEET_ID: target spreadsheet (required)
//! - WEBDRIVER_URL: chromedriver endpoint (default: http://localhost:9515)
//! - SESSION_FILE: persisted session artifact (default: session.json)
//! - PORT: HTTP port (default: 8080)
//! - ORDERSYNC_LOG: tracing filter (default: info)

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ordersync::config::{Config, LOG_ENV_VAR};
use ordersync::driver::WebDriverSession;
use ordersync::pipeline::OrderPipeline;
use ordersync::server::{self, AppState};
use ordersync::session::FileSessionStore;
use ordersync::sheets::GoogleSheetStore;
use ordersync::worker::JobPool;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Starting ordersync server");

    let driver = Arc::new(WebDriverSession::new(config.driver.clone())?);
    let sessions = Arc::new(FileSessionStore::new(config.driver.session_file.clone()));
    let sheets = Arc::new(GoogleSheetStore::new(&config.sheets)?);

    let pipeline = Arc::new(OrderPipeline::new(
        driver,
        sessions,
        sheets,
        config.dashboard.clone(),
        config.timeouts,
    ));
    let pool = JobPool::spawn(pipeline, config.server.queue_capacity);

    server::serve(&config.server, Arc::new(AppState { pool })).await?;
    Ok(())
}
