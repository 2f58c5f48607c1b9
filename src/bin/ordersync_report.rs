//! ordersync-report: new-client appointment feed for the monthly report.
//!
//! Usage: ordersync-report [START_DATE] [END_DATE]   (YYYY-MM-DD)
//!
//! Logs into the scheduling dashboard, reads calendar events for the date
//! range through the dashboard's authenticated API, filters the events
//! flagged as new clients, and appends one row per appointment to the
//! month table of its appointment date, under the monthly-report header.
//! Defaults to the current month so far. Point SPREADSHEET_ID at the
//! operational-report spreadsheet.
//!
//! ## Configuration
//! - BLVD_EMAIL / BLVD_PASSWORD: dashboard credentials (required)
//! - BLVD_BUSINESS_ID / BLVD_LOCATION_ID: calendar identity (required)
//! - GOOGLE_CREDENTIALS_B64: base64 service-account key JSON (required)
//! - SPREADSHEET_ID: report spreadsheet (required)
//! - WEBDRIVER_URL: chromedriver endpoint (default: http://localhost:9515)
//! - SESSION_FILE: persisted session artifact (default: session.json)
//! - ORDERSYNC_LOG: tracing filter (default: info)

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ordersync::auth::AuthSession;
use ordersync::calendar::{new_client_records, CalendarClient};
use ordersync::config::{CalendarConfig, Config, LOG_ENV_VAR};
use ordersync::driver::WebDriverSession;
use ordersync::interfaces::{DriverSession, SheetStore};
use ordersync::model::month_name;
use ordersync::session::FileSessionStore;
use ordersync::sheets::schema::{report_row_cells, MONTHLY_REPORT_HEADER};
use ordersync::sheets::GoogleSheetStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let today = Utc::now().date_naive();
    let mut args = std::env::args().skip(1);
    let start = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
        None => today.with_day(1).unwrap_or(today),
    };
    let end = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
        None => today,
    };

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    let calendar_config = CalendarConfig::from_env().map_err(|e| {
        error!("Failed to load calendar configuration: {}", e);
        e
    })?;

    info!(%start, %end, "starting new-client report feed");

    let driver = WebDriverSession::new(config.driver.clone())?;
    let sessions = FileSessionStore::new(config.driver.session_file.clone());
    let auth = AuthSession::new(&driver, &sessions, &config.dashboard, &config.timeouts);
    auth.authenticate().await?;
    let session_state = driver.capture_state().await?;

    let calendar = CalendarClient::new(calendar_config, &config.dashboard)?;
    let events = calendar.fetch_events(&session_state, start, end).await?;
    let records = new_client_records(&events);

    let store = GoogleSheetStore::new(&config.sheets)?;
    for record in &records {
        // Appointments file under the month they happen in; records with
        // no parseable date land in the current month.
        let table = month_name(record.appointment_day().unwrap_or(today));
        let handle = store.ensure_table(table, &MONTHLY_REPORT_HEADER).await?;
        store.append_row(&handle, report_row_cells(record)).await?;
        info!(
            client = %record.client_name,
            date = %record.appointment_date,
            table,
            "appointment row appended"
        );
    }

    info!(
        events = events.len(),
        appended = records.len(),
        "report feed complete"
    );
    Ok(())
}
