//! ordersync-export: one-shot sheet-to-JSON export.
//!
//! Usage: ordersync-export [SHEET_NAME] [OUTPUT_FILE]
//!
//! Defaults to the "October" sheet and `<sheet>_data.json`. Read-only;
//! requires only the spreadsheet configuration:
//! - GOOGLE_CREDENTIALS_B64: base64 service-account key JSON
//! - SPREADSHEET_ID: source spreadsheet

use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ordersync::config::{SheetsConfig, LOG_ENV_VAR};
use ordersync::export::export_sheet;
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

    let mut args = std::env::args().skip(1);
    let sheet_name = args.next().unwrap_or_else(|| "October".to_string());
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}_data.json", sheet_name.to_lowercase())));

    let config = SheetsConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    let store = GoogleSheetStore::new(&config)?;

    let count = export_sheet(&store, &sheet_name, &output).await?;
    info!(sheet = %sheet_name, records = count, output = %output.display(), "export complete");
    Ok(())
}
