//! Spreadsheet ledger interface.

use async_trait::async_trait;
use serde_json::Value;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur against the spreadsheet store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("spreadsheet service unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("spreadsheet service rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("service-account authorization failed: {0}")]
    Auth(String),

    #[error("malformed spreadsheet response: {0}")]
    Malformed(String),
}

/// Handle to one named table within the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    /// Worksheet title, e.g. "October".
    pub title: String,
    /// Backend sheet id; zero for in-memory implementations.
    pub sheet_id: i64,
}

/// Interface for the month-keyed ledger.
///
/// Implementations:
/// - `GoogleSheetStore`: Google Sheets v4 REST API
/// - `MockSheetStore`: in-memory tables for tests
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Return the table named `name`, creating it with `header` as its
    /// first row when absent. Idempotent: an existing non-empty table is
    /// returned as-is and its header is never rewritten; a table that
    /// exists but holds no rows at all gets the header written.
    async fn ensure_table(&self, name: &str, header: &[&str]) -> Result<TableHandle>;

    /// Append one row of cells, in the table's declared column order.
    async fn append_row(&self, handle: &TableHandle, cells: Vec<String>) -> Result<()>;

    /// Every data row of `name` as key→value records.
    ///
    /// Header labels are reversed from Title Case to snake_case, all-empty
    /// rows are skipped, and purely numeric-looking cells are coerced to
    /// JSON numbers. Used by the export utility; never mutates the table.
    async fn read_all(&self, name: &str) -> Result<Vec<serde_json::Map<String, Value>>>;
}
