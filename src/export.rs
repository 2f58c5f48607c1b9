//! Spreadsheet-to-JSON export.
//!
//! Read-only companion to the ledger: reads one table through the
//! SheetStore, reverses the Title-Case headers to snake_case keys, and
//! writes a formatted JSON array to a local file.

use std::path::Path;

use tracing::info;

use crate::interfaces::{SheetStore, StoreError};

/// Result type for exports.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur during an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not write output file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Export every data row of `sheet_name` to `output` as pretty JSON.
///
/// Returns the number of records written. Never mutates the source table.
pub async fn export_sheet(
    store: &dyn SheetStore,
    sheet_name: &str,
    output: &Path,
) -> Result<usize> {
    let records = store.read_all(sheet_name).await?;
    let json = serde_json::to_vec_pretty(&records)?;
    tokio::fs::write(output, json).await?;
    info!(
        sheet = sheet_name,
        records = records.len(),
        output = %output.display(),
        "sheet exported"
    );
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockSheetStore;

    #[tokio::test]
    async fn test_export_roundtrip_numeric_and_text_cells() {
        let store = MockSheetStore::new();
        store
            .seed_table(
                "October",
                vec![
                    vec!["Client Name".to_string(), "Price".to_string()],
                    vec!["Dana".to_string(), "150.00".to_string()],
                    vec!["Riley".to_string(), "N/A".to_string()],
                ],
            )
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("october_data.json");
        let count = export_sheet(&store, "October", &output).await.unwrap();
        assert_eq!(count, 2);

        let raw = std::fs::read(&output).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(records[0]["client_name"], "Dana");
        assert_eq!(records[0]["price"], serde_json::json!(150.0));
        assert_eq!(records[1]["price"], "N/A");
    }

    #[tokio::test]
    async fn test_export_empty_table_writes_empty_array() {
        let store = MockSheetStore::new();
        store
            .seed_table("November", vec![vec!["Client Name".to_string()]])
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("november_data.json");
        let count = export_sheet(&store, "November", &output).await.unwrap();
        assert_eq!(count, 0);
        let raw = std::fs::read_to_string(&output).unwrap();
        assert_eq!(raw.trim(), "[]");
    }
}
