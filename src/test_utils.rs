//! Test utilities and mock implementations.
//!
//! Mock implementations of the capability traits so the pipeline can be
//! exercised without a browser, a WebDriver endpoint, or the Sheets API.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::interfaces::driver::{DriverError, DriverSession, Result as DriverResult, SessionState};
use crate::interfaces::sheet_store::{
    Result as StoreResult, SheetStore, StoreError, TableHandle,
};
use crate::sheets::schema;

/// One recorded driver interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Goto(String),
    Fill(String, String),
    Click(String),
    WaitFor(String),
}

/// Scripted in-memory browser driver.
///
/// Element presence is scripted per selector: a queue of one-shot answers
/// (consumed in order) falls back to a steady-state answer, which defaults
/// to absent. Waits resolve immediately; no test ever sleeps.
#[derive(Default)]
pub struct MockDriver {
    calls: RwLock<Vec<DriverCall>>,
    scripted: RwLock<HashMap<String, VecDeque<bool>>>,
    steady: RwLock<HashMap<String, bool>>,
    texts: RwLock<HashMap<String, String>>,
    applied_state: RwLock<Option<SessionState>>,
    fail_launch: RwLock<bool>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steady-state presence for a selector.
    pub async fn set_present(&self, selector: &str, present: bool) {
        self.steady
            .write()
            .await
            .insert(selector.to_string(), present);
    }

    /// One-shot presence answers, consumed before the steady state.
    pub async fn push_presence(&self, selector: &str, answers: Vec<bool>) {
        self.scripted
            .write()
            .await
            .entry(selector.to_string())
            .or_default()
            .extend(answers);
    }

    /// Visible text returned for a selector.
    pub async fn set_text(&self, selector: &str, text: &str) {
        self.texts
            .write()
            .await
            .insert(selector.to_string(), text.to_string());
    }

    pub async fn set_fail_launch(&self, fail: bool) {
        *self.fail_launch.write().await = fail;
    }

    pub async fn calls(&self) -> Vec<DriverCall> {
        self.calls.read().await.clone()
    }

    pub async fn fill_count(&self, selector: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, DriverCall::Fill(s, _) if s == selector))
            .count()
    }

    pub async fn click_count(&self, selector: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, DriverCall::Click(s) if s == selector))
            .count()
    }

    /// Session state handed to `apply_state`, if any.
    pub async fn applied_state(&self) -> Option<SessionState> {
        self.applied_state.read().await.clone()
    }

    async fn present(&self, selector: &str) -> bool {
        if let Some(queue) = self.scripted.write().await.get_mut(selector) {
            if let Some(answer) = queue.pop_front() {
                return answer;
            }
        }
        self.steady
            .read()
            .await
            .get(selector)
            .copied()
            .unwrap_or(false)
    }
}

#[async_trait]
impl DriverSession for MockDriver {
    async fn launch(&self) -> DriverResult<()> {
        if *self.fail_launch.read().await {
            return Err(DriverError::Launch("scripted launch failure".to_string()));
        }
        Ok(())
    }

    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.calls
            .write()
            .await
            .push(DriverCall::Goto(url.to_string()));
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> DriverResult<()> {
        self.calls
            .write()
            .await
            .push(DriverCall::Fill(selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> DriverResult<()> {
        self.calls
            .write()
            .await
            .push(DriverCall::Click(selector.to_string()));
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        self.calls
            .write()
            .await
            .push(DriverCall::WaitFor(selector.to_string()));
        if self.present(selector).await {
            Ok(())
        } else {
            Err(DriverError::ElementTimeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn visible_text(&self, selector: &str) -> DriverResult<String> {
        Ok(self
            .texts
            .read()
            .await
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn capture_state(&self) -> DriverResult<SessionState> {
        Ok(SessionState {
            cookies: vec![serde_json::json!({"name": "_session", "value": "mock"})],
        })
    }

    async fn apply_state(&self, state: &SessionState) -> DriverResult<()> {
        *self.applied_state.write().await = Some(state.clone());
        Ok(())
    }
}

/// In-memory ledger store.
///
/// Tables hold raw cell rows with the header first, exactly like the
/// remote spreadsheet. Failure switches let tests exercise outage paths.
#[derive(Default)]
pub struct MockSheetStore {
    tables: RwLock<BTreeMap<String, Vec<Vec<String>>>>,
    fail_on_append: RwLock<bool>,
    fail_on_ensure: RwLock<bool>,
}

impl MockSheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_append(&self, fail: bool) {
        *self.fail_on_append.write().await = fail;
    }

    pub async fn set_fail_on_ensure(&self, fail: bool) {
        *self.fail_on_ensure.write().await = fail;
    }

    /// Seed a table with raw values, header row first.
    pub async fn seed_table(&self, name: &str, values: Vec<Vec<String>>) {
        self.tables.write().await.insert(name.to_string(), values);
    }

    /// Data rows of a table (header excluded).
    pub async fn rows(&self, name: &str) -> Vec<Vec<String>> {
        self.tables
            .read()
            .await
            .get(name)
            .map(|values| values.iter().skip(1).cloned().collect())
            .unwrap_or_default()
    }

    pub async fn row_count(&self, name: &str) -> usize {
        self.rows(name).await.len()
    }

    /// Header row of a table, if the table exists.
    pub async fn header(&self, name: &str) -> Option<Vec<String>> {
        self.tables
            .read()
            .await
            .get(name)
            .and_then(|values| values.first().cloned())
    }

    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    fn outage() -> StoreError {
        StoreError::Rejected {
            status: 503,
            body: "scripted outage".to_string(),
        }
    }
}

#[async_trait]
impl SheetStore for MockSheetStore {
    async fn ensure_table(&self, name: &str, header: &[&str]) -> StoreResult<TableHandle> {
        if *self.fail_on_ensure.read().await {
            return Err(Self::outage());
        }
        let mut tables = self.tables.write().await;
        let rows = tables.entry(name.to_string()).or_default();
        if rows.is_empty() {
            rows.push(header.iter().map(|s| s.to_string()).collect());
        }
        Ok(TableHandle {
            title: name.to_string(),
            sheet_id: 0,
        })
    }

    async fn append_row(&self, handle: &TableHandle, cells: Vec<String>) -> StoreResult<()> {
        if *self.fail_on_append.read().await {
            return Err(Self::outage());
        }
        let mut tables = self.tables.write().await;
        tables
            .get_mut(&handle.title)
            .ok_or_else(|| StoreError::Malformed(format!("no such table: {}", handle.title)))?
            .push(cells);
        Ok(())
    }

    async fn read_all(&self, name: &str) -> StoreResult<Vec<serde_json::Map<String, Value>>> {
        let tables = self.tables.read().await;
        let values = tables
            .get(name)
            .ok_or_else(|| StoreError::Malformed(format!("no such table: {name}")))?;
        Ok(schema::records_from_values(values))
    }
}
