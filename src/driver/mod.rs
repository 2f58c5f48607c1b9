//! WebDriver-backed browser session.
//!
//! Speaks the W3C WebDriver protocol over HTTP against a chromedriver
//! endpoint. One browser context at most; `launch` is idempotent and every
//! command lazily requires the session to exist.

pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::interfaces::driver::{DriverError, DriverSession, Result, SessionState};
use wire::{
    AddCookieRequest, ErrorValue, FindElementRequest, GotoRequest, NewSessionRequest,
    NewSessionValue, SendKeysRequest, ValueResponse, ELEMENT_KEY,
};

/// How often `wait_for` re-polls element lookup.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser session driven over the WebDriver protocol.
pub struct WebDriverSession {
    http: reqwest::Client,
    config: DriverConfig,
    session_id: RwLock<Option<String>>,
}

impl WebDriverSession {
    pub fn new(config: DriverConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            config,
            session_id: RwLock::new(None),
        })
    }

    async fn session_id(&self) -> Result<String> {
        self.session_id
            .read()
            .await
            .clone()
            .ok_or(DriverError::NoSession)
    }

    fn command_url(&self, session_id: &str, path: &str) -> String {
        format!(
            "{}/session/{}/{}",
            self.config.webdriver_url.trim_end_matches('/'),
            session_id,
            path
        )
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let response = self.http.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            let detail = serde_json::from_str::<ValueResponse<ErrorValue>>(&body)
                .map(|e| format!("{}: {}", e.value.error, e.value.message))
                .unwrap_or(body);
            return Err(DriverError::Protocol(format!("{status}: {detail}")));
        }
        serde_json::from_str(&body).map_err(|e| DriverError::Protocol(e.to_string()))
    }

    /// Single element lookup. `Ok(None)` when the element is absent.
    async fn find_element(&self, selector: &str) -> Result<Option<String>> {
        let session_id = self.session_id().await?;
        let url = self.command_url(&session_id, "element");
        let response = self
            .http
            .post(&url)
            .json(&FindElementRequest::css(selector))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status != StatusCode::OK {
            return Err(DriverError::Protocol(format!("{status}: {body}")));
        }
        let value: ValueResponse<Value> =
            serde_json::from_str(&body).map_err(|e| DriverError::Protocol(e.to_string()))?;
        Ok(value.value[ELEMENT_KEY].as_str().map(str::to_string))
    }

    /// Lookup that treats absence as a protocol-level unexpected state.
    async fn require_element(&self, selector: &str) -> Result<String> {
        self.find_element(selector)
            .await?
            .ok_or_else(|| DriverError::ElementTimeout {
                selector: selector.to_string(),
                timeout: Duration::ZERO,
            })
    }
}

#[async_trait]
impl DriverSession for WebDriverSession {
    async fn launch(&self) -> Result<()> {
        let mut slot = self.session_id.write().await;
        if slot.is_some() {
            return Ok(());
        }
        let url = format!(
            "{}/session",
            self.config.webdriver_url.trim_end_matches('/')
        );
        let response: ValueResponse<NewSessionValue> = self
            .post(&url, &NewSessionRequest::chrome(self.config.headless))
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        info!(
            session_id = %response.value.session_id,
            headless = self.config.headless,
            "browser session started"
        );
        *slot = Some(response.value.session_id);
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        let session_id = self.session_id().await?;
        debug!(url, "navigating");
        let _: ValueResponse<Value> = self
            .post(&self.command_url(&session_id, "url"), &GotoRequest { url })
            .await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let session_id = self.session_id().await?;
        let element = self.require_element(selector).await?;
        let _: ValueResponse<Value> = self
            .post(
                &self.command_url(&session_id, &format!("element/{element}/clear")),
                &serde_json::json!({}),
            )
            .await?;
        let _: ValueResponse<Value> = self
            .post(
                &self.command_url(&session_id, &format!("element/{element}/value")),
                &SendKeysRequest { text: value },
            )
            .await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let session_id = self.session_id().await?;
        let element = self.require_element(selector).await?;
        let _: ValueResponse<Value> = self
            .post(
                &self.command_url(&session_id, &format!("element/{element}/click")),
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.find_element(selector).await?.is_some() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn visible_text(&self, selector: &str) -> Result<String> {
        let session_id = self.session_id().await?;
        let Some(element) = self.find_element(selector).await? else {
            return Ok(String::new());
        };
        let response: ValueResponse<String> = self
            .get(&self.command_url(&session_id, &format!("element/{element}/text")))
            .await?;
        Ok(response.value)
    }

    async fn capture_state(&self) -> Result<SessionState> {
        let session_id = self.session_id().await?;
        let response: ValueResponse<Vec<Value>> = self
            .get(&self.command_url(&session_id, "cookie"))
            .await?;
        Ok(SessionState {
            cookies: response.value,
        })
    }

    async fn apply_state(&self, state: &SessionState) -> Result<()> {
        // Cookies can only be attached while the browser sits on the target
        // origin; the caller navigates there first.
        let session_id = self.session_id().await?;
        let url = self.command_url(&session_id, "cookie");
        for cookie in &state.cookies {
            let _: ValueResponse<Value> = self.post(&url, &AddCookieRequest { cookie }).await?;
        }
        debug!(cookies = state.cookies.len(), "session state applied");
        Ok(())
    }
}
