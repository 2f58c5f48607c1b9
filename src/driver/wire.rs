//! W3C WebDriver wire types.
//!
//! Only the slice of the protocol this service uses: session creation,
//! navigation, element lookup, element interaction, and cookies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Element identifier key mandated by the W3C WebDriver specification.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// `POST /session` request body.
#[derive(Debug, Serialize)]
pub struct NewSessionRequest {
    pub capabilities: Capabilities,
}

#[derive(Debug, Serialize)]
pub struct Capabilities {
    #[serde(rename = "alwaysMatch")]
    pub always_match: Value,
}

impl NewSessionRequest {
    /// Chrome capabilities, optionally headless.
    pub fn chrome(headless: bool) -> Self {
        let mut args = vec!["--window-size=1920,1080".to_string()];
        if headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }
        Self {
            capabilities: Capabilities {
                always_match: serde_json::json!({
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args },
                }),
            },
        }
    }
}

/// Generic `{"value": ...}` response envelope.
#[derive(Debug, Deserialize)]
pub struct ValueResponse<T> {
    pub value: T,
}

/// `POST /session` response value.
#[derive(Debug, Deserialize)]
pub struct NewSessionValue {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// WebDriver error payload, present when a command fails.
#[derive(Debug, Deserialize)]
pub struct ErrorValue {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// `POST /session/{id}/url` request body.
#[derive(Debug, Serialize)]
pub struct GotoRequest<'a> {
    pub url: &'a str,
}

/// `POST /session/{id}/element` request body (CSS selector lookup).
#[derive(Debug, Serialize)]
pub struct FindElementRequest<'a> {
    pub using: &'static str,
    pub value: &'a str,
}

impl<'a> FindElementRequest<'a> {
    pub fn css(selector: &'a str) -> Self {
        Self {
            using: "css selector",
            value: selector,
        }
    }
}

/// `POST /session/{id}/element/{eid}/value` request body.
#[derive(Debug, Serialize)]
pub struct SendKeysRequest<'a> {
    pub text: &'a str,
}

/// `POST /session/{id}/cookie` request body.
#[derive(Debug, Serialize)]
pub struct AddCookieRequest<'a> {
    pub cookie: &'a Value,
}
