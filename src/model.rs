//! Core data types: webhook payloads, client projections, ledger rows,
//! and the month-routing rule for ledger tables.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One order-creation webhook event from the CRM.
///
/// All fields are opaque strings except `created_on`, which drives month
/// routing. Unknown JSON fields are ignored; missing fields default to the
/// empty string. Immutable once received.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OrderPayload {
    pub contact_id: String,
    pub first_name: String,
    pub email: String,
    pub phone: String,
    pub full_address: String,
    pub transaction_id: String,
    pub payment_status: String,
    pub product_title: String,
    #[serde(deserialize_with = "string_or_number")]
    pub subtotal: String,
    #[serde(deserialize_with = "string_or_number")]
    pub total_amount: String,
    pub gateway: String,
    pub card_brand: String,
    #[serde(deserialize_with = "string_or_number")]
    pub card_last4: String,
    pub currency_code: String,
    pub created_on: String,
}

impl OrderPayload {
    /// Parse `created_on` into a calendar date.
    ///
    /// Accepts RFC 3339 timestamps or a bare `YYYY-MM-DD` prefix (the CRM
    /// sends both depending on the trigger). Returns `None` when the field
    /// is missing or unparseable.
    pub fn created_on_date(&self) -> Option<NaiveDate> {
        let raw = self.created_on.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.date_naive());
        }
        let date_part = raw.split('T').next().unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

/// CRM gateways send amounts as JSON numbers or strings interchangeably.
/// Either way the ledger stores the verbatim text.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Minimal projection of an order used to fill the dashboard's client form.
///
/// Derived per pipeline run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ClientRecord {
    pub fn from_payload(payload: &OrderPayload) -> Self {
        Self {
            name: payload.first_name.trim().to_string(),
            email: payload.email.trim().to_string(),
            phone: payload.phone.trim().to_string(),
            address: payload.full_address.trim().to_string(),
        }
    }

    /// Split the name into (first, last) for the creation form.
    ///
    /// The CRM frequently supplies only a first name, in which case the
    /// last-name half is empty.
    pub fn split_name(&self) -> (&str, &str) {
        match self.name.split_once(' ') {
            Some((first, last)) => (first, last.trim()),
            None => (self.name.as_str(), ""),
        }
    }
}

/// Terminal disposition of one pipeline run.
///
/// `Pending` completes the status vocabulary for ledger consumers, but the
/// pipeline itself only ever writes `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

/// One ledger entry: the order fields plus disposition and write time.
///
/// Exactly one row is appended per processed payload, success or failure.
/// Rows are append-only and never updated.
#[derive(Debug, Clone)]
pub struct StatusRow {
    pub payload: OrderPayload,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

impl StatusRow {
    pub fn new(payload: &OrderPayload, status: OrderStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            payload: payload.clone(),
            status,
            timestamp,
        }
    }
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Ledger table name for an order.
///
/// The business reports on "yesterday's appointments", so an order is filed
/// under the month of `created_on` minus one day. This offset is intentional:
/// an order dated the first of month M+1 belongs to M's report. Orders with
/// a missing or unparseable `created_on` are filed under the current month.
pub fn month_table_name(created_on: Option<NaiveDate>, today: NaiveDate) -> &'static str {
    let anchor = created_on.unwrap_or(today);
    let filed = anchor.checked_sub_days(Days::new(1)).unwrap_or(anchor);
    month_name(filed)
}

/// English month name for a date, matching the ledger's table names.
pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_routing_last_day_of_month_stays_in_month() {
        // Processed the next day; routing depends only on created_on.
        let created = Some(date(2025, 10, 31));
        assert_eq!(month_table_name(created, date(2025, 11, 1)), "October");
    }

    #[test]
    fn test_month_routing_first_of_month_files_under_previous() {
        let created = Some(date(2025, 11, 1));
        assert_eq!(month_table_name(created, date(2025, 11, 1)), "October");
    }

    #[test]
    fn test_month_routing_mid_month() {
        let created = Some(date(2025, 10, 15));
        assert_eq!(month_table_name(created, date(2025, 10, 16)), "October");
    }

    #[test]
    fn test_month_routing_missing_date_uses_today() {
        assert_eq!(month_table_name(None, date(2025, 12, 5)), "December");
    }

    #[test]
    fn test_created_on_rfc3339() {
        let payload = OrderPayload {
            created_on: "2025-10-11T10:00:00-05:00".to_string(),
            ..Default::default()
        };
        assert_eq!(payload.created_on_date(), Some(date(2025, 10, 11)));
    }

    #[test]
    fn test_created_on_bare_date() {
        let payload = OrderPayload {
            created_on: "2025-10-31".to_string(),
            ..Default::default()
        };
        assert_eq!(payload.created_on_date(), Some(date(2025, 10, 31)));
    }

    #[test]
    fn test_created_on_malformed_is_none() {
        let payload = OrderPayload {
            created_on: "last tuesday".to_string(),
            ..Default::default()
        };
        assert_eq!(payload.created_on_date(), None);
    }

    #[test]
    fn test_payload_tolerates_numeric_amounts_and_unknown_fields() {
        let payload: OrderPayload = serde_json::from_str(
            r#"{
                "contact_id": "C-1",
                "first_name": "Dana",
                "subtotal": 150.0,
                "total_amount": "162.50",
                "card_last4": 4242,
                "some_future_field": {"ignored": true}
            }"#,
        )
        .unwrap();
        assert_eq!(payload.subtotal, "150.0");
        assert_eq!(payload.total_amount, "162.50");
        assert_eq!(payload.card_last4, "4242");
        assert_eq!(payload.email, "");
    }

    #[test]
    fn test_split_name() {
        let client = ClientRecord {
            name: "Dana Reyes".to_string(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
        };
        assert_eq!(client.split_name(), ("Dana", "Reyes"));

        let first_only = ClientRecord {
            name: "Dana".to_string(),
            ..client
        };
        assert_eq!(first_only.split_name(), ("Dana", ""));
    }
}
