//! Calendar reads through the dashboard's authenticated API.
//!
//! The dashboard exposes its calendar as a JSON endpoint guarded by the
//! same cookies the browser session holds, so no page scraping is needed:
//! the captured session state becomes a `Cookie` header. Events flagged as
//! new clients are distilled into appointment records that feed the
//! monthly operational report.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{CalendarConfig, DashboardConfig};
use crate::interfaces::SessionState;
use crate::model::string_or_number;

/// Result type for calendar reads.
pub type Result<T> = std::result::Result<T, CalendarError>;

/// Errors that can occur against the calendar endpoint.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("calendar endpoint unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("calendar endpoint rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed calendar response: {0}")]
    Malformed(String),
}

/// One calendar event as the endpoint reports it.
///
/// Identifiers arrive as strings or numbers depending on the event kind,
/// and the new-client flag lives either on the event or on its nested
/// client object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalendarEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub start: String,
    #[serde(deserialize_with = "lenient_price")]
    pub price: f64,
    pub is_new_client: bool,
    pub client: Option<EventClient>,
    pub service: Option<EventService>,
    #[serde(deserialize_with = "string_or_number")]
    pub client_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub staff_id: String,
    #[serde(deserialize_with = "opt_string_or_number")]
    pub recurring_appointment_id: Option<String>,
}

impl CalendarEvent {
    /// Whether this event is a new-client appointment, wherever the flag
    /// lives.
    pub fn flags_new_client(&self) -> bool {
        self.is_new_client || self.client.as_ref().is_some_and(|c| c.is_new_client)
    }
}

/// Nested client object on a calendar event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventClient {
    pub name: String,
    pub is_new_client: bool,
}

/// Nested service object on a calendar event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventService {
    pub name: String,
}

/// Prices arrive as numbers or numeric strings; anything else reads as 0.0.
fn lenient_price<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn opt_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Fields the monthly report cares about, pulled from one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentRecord {
    pub appointment_id: String,
    pub client_name: String,
    /// MM/DD/YYYY, or the raw start text when it would not parse.
    pub appointment_date: String,
    pub service_name: String,
    pub price: f64,
    pub client_id: String,
    pub staff_id: String,
    pub recurring_appointment_id: Option<String>,
}

impl AppointmentRecord {
    pub fn from_event(event: &CalendarEvent) -> Self {
        Self {
            appointment_id: or_na(&event.id),
            client_name: or_na(&event.title),
            appointment_date: format_appointment_date(&event.start),
            service_name: event
                .service
                .as_ref()
                .map(|s| s.name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            price: event.price,
            client_id: or_na(&event.client_id),
            staff_id: or_na(&event.staff_id),
            recurring_appointment_id: event.recurring_appointment_id.clone(),
        }
    }

    /// Calendar day of the appointment, for month routing. `None` when the
    /// event carried no parseable start date.
    pub fn appointment_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.appointment_date, "%m/%d/%Y").ok()
    }
}

fn or_na(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "N/A".to_string()
    } else {
        trimmed.to_string()
    }
}

/// "2025-10-11T10:00:00-05:00" → "10/11/2025". Unparseable starts pass
/// through verbatim; an empty start becomes "N/A".
fn format_appointment_date(start: &str) -> String {
    let raw = start.trim();
    if raw.is_empty() {
        return "N/A".to_string();
    }
    let date_part = raw.split('T').next().unwrap_or(raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%m/%d/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Every new-client event in `events`, as report-ready records.
pub fn new_client_records(events: &[CalendarEvent]) -> Vec<AppointmentRecord> {
    let records: Vec<AppointmentRecord> = events
        .iter()
        .filter(|event| event.flags_new_client())
        .map(AppointmentRecord::from_event)
        .collect();
    info!(
        total = events.len(),
        new_clients = records.len(),
        "calendar events filtered"
    );
    records
}

/// Pull the event list out of a calendar response.
///
/// The endpoint has returned a bare array, an `events` field, and a `data`
/// field across dashboard versions; all three parse. A response with none
/// of them holds no events.
pub fn events_from_response(raw: Value) -> Result<Vec<CalendarEvent>> {
    let list = match raw {
        Value::Array(events) => events,
        Value::Object(mut map) => match map.remove("events").or_else(|| map.remove("data")) {
            Some(Value::Array(events)) => events,
            Some(_) => {
                return Err(CalendarError::Malformed(
                    "events field is not an array".to_string(),
                ))
            }
            None => Vec::new(),
        },
        other => {
            return Err(CalendarError::Malformed(format!(
                "expected events array or object, got {other}"
            )))
        }
    };
    list.into_iter()
        .map(|event| {
            serde_json::from_value(event).map_err(|e| CalendarError::Malformed(e.to_string()))
        })
        .collect()
}

/// Calendar reader that reuses the browser session's cookies.
pub struct CalendarClient {
    http: reqwest::Client,
    base_url: String,
    config: CalendarConfig,
}

impl CalendarClient {
    pub fn new(config: CalendarConfig, dashboard: &DashboardConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: dashboard.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Fetch every event in `[start, end]`, inclusive.
    pub async fn fetch_events(
        &self,
        session: &SessionState,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEvent>> {
        let url = format!(
            "{}/businesses/{}/calendar_events?start={start}&end={end}&location_id={}&include_zero_minute=true",
            self.base_url, self.config.business_id, self.config.location_id
        );
        debug!(%url, "fetching calendar events");
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::COOKIE, cookie_header(session))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CalendarError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let raw: Value =
            serde_json::from_str(&body).map_err(|e| CalendarError::Malformed(e.to_string()))?;
        let events = events_from_response(raw)?;
        info!(count = events.len(), %start, %end, "calendar events fetched");
        Ok(events)
    }
}

/// `Cookie:` header value from a captured session. Cookies without a
/// name/value pair are skipped.
fn cookie_header(session: &SessionState) -> String {
    session
        .cookies
        .iter()
        .filter_map(|cookie| {
            let name = cookie.get("name")?.as_str()?;
            let value = cookie.get("value")?.as_str()?;
            Some(format!("{name}={value}"))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
