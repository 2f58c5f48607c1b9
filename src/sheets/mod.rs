//! Google Sheets implementation of the ledger store.
//!
//! Month tables are worksheets in one spreadsheet. Tables are created
//! lazily with their header as the first row; the header is written once
//! and never rewritten. Rows are append-only.

pub mod auth;
pub mod schema;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::SheetsConfig;
use crate::interfaces::sheet_store::{Result, SheetStore, StoreError, TableHandle};
use auth::{ServiceAccountKey, TokenProvider};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Ledger store backed by the Google Sheets v4 REST API.
pub struct GoogleSheetStore {
    http: reqwest::Client,
    tokens: TokenProvider,
    spreadsheet_id: String,
    /// Tables already verified or created by this process. Guards against
    /// re-writing a header within one process lifetime.
    known_tables: RwLock<HashMap<String, TableHandle>>,
}

impl GoogleSheetStore {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        let key = ServiceAccountKey::from_b64(&config.credentials_b64)?;
        Ok(Self {
            tokens: TokenProvider::new(http.clone(), key),
            http,
            spreadsheet_id: config.spreadsheet_id.clone(),
            known_tables: RwLock::new(HashMap::new()),
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!("{SHEETS_API_BASE}/{}{suffix}", self.spreadsheet_id)
    }

    async fn api_get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let bearer = self.tokens.bearer().await?;
        let response = self.http.get(url).bearer_auth(bearer).send().await?;
        Self::decode(response).await
    }

    async fn api_post<T: serde::de::DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T> {
        let bearer = self.tokens.bearer().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn find_sheet(&self, name: &str) -> Result<Option<TableHandle>> {
        let meta: SpreadsheetMeta = self
            .api_get(&self.url("?fields=sheets.properties"))
            .await?;
        Ok(meta
            .sheets
            .into_iter()
            .find(|sheet| sheet.properties.title == name)
            .map(|sheet| TableHandle {
                title: sheet.properties.title,
                sheet_id: sheet.properties.sheet_id,
            }))
    }

    async fn add_sheet(&self, name: &str) -> Result<TableHandle> {
        let body = serde_json::json!({
            "requests": [{ "addSheet": { "properties": { "title": name } } }]
        });
        let response: Value = self.api_post(&self.url(":batchUpdate"), &body).await?;
        let sheet_id = response["replies"][0]["addSheet"]["properties"]["sheetId"]
            .as_i64()
            .ok_or_else(|| StoreError::Malformed("addSheet reply missing sheetId".to_string()))?;
        Ok(TableHandle {
            title: name.to_string(),
            sheet_id,
        })
    }

    /// Whether row 1 of the worksheet holds any non-empty cell.
    async fn first_row_present(&self, title: &str) -> Result<bool> {
        let url = self.url(&format!(
            "/values/{}",
            urlencode(&format!("'{title}'!1:1"))
        ));
        let range: ValueRange = self.api_get(&url).await?;
        Ok(range
            .values
            .first()
            .is_some_and(|row| row.iter().any(|cell| !cell.trim().is_empty())))
    }

    async fn write_header(&self, title: &str, header: &[&str]) -> Result<()> {
        let cells: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        self.append_values(title, &cells).await
    }

    async fn append_values(&self, title: &str, cells: &[String]) -> Result<()> {
        let range = format!("'{title}'!A1");
        let url = self.url(&format!(
            "/values/{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            urlencode(&range)
        ));
        let body = serde_json::json!({ "values": [cells] });
        let _: Value = self.api_post(&url, &body).await?;
        Ok(())
    }
}

#[async_trait]
impl SheetStore for GoogleSheetStore {
    async fn ensure_table(&self, name: &str, header: &[&str]) -> Result<TableHandle> {
        if let Some(handle) = self.known_tables.read().await.get(name) {
            return Ok(handle.clone());
        }

        let handle = match self.find_sheet(name).await? {
            Some(handle) => {
                // A crash between worksheet creation and the header write
                // leaves an empty sheet behind; heal it before handing the
                // table out.
                if self.first_row_present(&handle.title).await? {
                    debug!(table = name, "month table already present");
                } else {
                    self.write_header(&handle.title, header).await?;
                    info!(table = name, "header written to empty month table");
                }
                handle
            }
            None => {
                let handle = self.add_sheet(name).await?;
                self.write_header(&handle.title, header).await?;
                info!(table = name, "month table created");
                handle
            }
        };

        self.known_tables
            .write()
            .await
            .insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    async fn append_row(&self, handle: &TableHandle, cells: Vec<String>) -> Result<()> {
        self.append_values(&handle.title, &cells).await?;
        debug!(table = %handle.title, "status row appended");
        Ok(())
    }

    async fn read_all(&self, name: &str) -> Result<Vec<serde_json::Map<String, Value>>> {
        let url = self.url(&format!("/values/{}", urlencode(&format!("'{name}'"))));
        let range: ValueRange = self.api_get(&url).await?;
        Ok(schema::records_from_values(&range.values))
    }
}

/// Percent-encode a range for a path segment. Only the characters that
/// occur in quoted sheet titles need escaping.
fn urlencode(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace('\'', "%27")
        .replace(' ', "%20")
        .replace('!', "%21")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlencode_quoted_range() {
        assert_eq!(urlencode("'October'!A1"), "%27October%27%21A1");
    }

    #[test]
    fn test_spreadsheet_meta_parses() {
        let meta: SpreadsheetMeta = serde_json::from_str(
            r#"{"sheets":[{"properties":{"sheetId":7,"title":"October"}}]}"#,
        )
        .unwrap();
        assert_eq!(meta.sheets.len(), 1);
        assert_eq!(meta.sheets[0].properties.sheet_id, 7);
        assert_eq!(meta.sheets[0].properties.title, "October");
    }

    #[test]
    fn test_value_range_defaults_to_empty() {
        let range: ValueRange = serde_json::from_str(r#"{"range":"'October'"}"#).unwrap();
        assert!(range.values.is_empty());
    }
}
