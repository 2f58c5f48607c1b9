//! Ledger table schemas and header/value conversions.
//!
//! Two fixed header sets live here: the 17-column order-ledger schema the
//! pipeline appends to, and the 22-column monthly operational-report schema
//! the business maintains by hand. The export utility's Title-Case →
//! snake_case reversal applies generically to whichever table it reads.

use serde_json::{Map, Number, Value};

use crate::calendar::AppointmentRecord;
use crate::model::StatusRow;

/// Order-ledger header, in append order.
pub const ORDER_LEDGER_HEADER: [&str; 17] = [
    "Contact ID",
    "First Name",
    "Email",
    "Phone",
    "Full Address",
    "Transaction ID",
    "Payment Status",
    "Product Title",
    "Subtotal",
    "Total Amount",
    "Gateway",
    "Card Brand",
    "Card Last4",
    "Currency Code",
    "Created On",
    "Status",
    "Timestamp",
];

/// Monthly operational-report header. The pipeline never writes this table;
/// it exists so exports of the hand-maintained report resolve its columns.
pub const MONTHLY_REPORT_HEADER: [&str; 22] = [
    "Number",
    "New Client Daily Count",
    "Appointment Date",
    "Next Appointment Date",
    "Client Name",
    "Phone Number",
    "Service Name",
    "Price",
    "Membership",
    "Visit",
    "Booked Date",
    "Front Desk",
    "Provider Name",
    "Date Treatment Plan Set",
    "Photos",
    "Charting",
    "Occupation",
    "Referral Source",
    "Referral Source 2",
    "Referral Name",
    "Form Compliance",
    "Interest 1–10",
];

/// Cells for one status row, in `ORDER_LEDGER_HEADER` order.
pub fn status_row_cells(row: &StatusRow) -> Vec<String> {
    let p = &row.payload;
    vec![
        p.contact_id.clone(),
        p.first_name.clone(),
        p.email.clone(),
        p.phone.clone(),
        p.full_address.clone(),
        p.transaction_id.clone(),
        p.payment_status.clone(),
        p.product_title.clone(),
        p.subtotal.clone(),
        p.total_amount.clone(),
        p.gateway.clone(),
        p.card_brand.clone(),
        p.card_last4.clone(),
        p.currency_code.clone(),
        p.created_on.clone(),
        row.status.as_str().to_string(),
        row.timestamp.to_rfc3339(),
    ]
}

/// Cells for one appointment record, in `MONTHLY_REPORT_HEADER` order.
///
/// Only the columns the calendar knows are filled; the rest stay empty
/// for the front desk to complete by hand.
pub fn report_row_cells(record: &AppointmentRecord) -> Vec<String> {
    let mut cells = vec![String::new(); MONTHLY_REPORT_HEADER.len()];
    cells[2] = record.appointment_date.clone();
    cells[4] = record.client_name.clone();
    cells[6] = record.service_name.clone();
    cells[7] = format!("{:.2}", record.price);
    cells
}

/// "Client Name" → "client_name".
pub fn title_to_snake(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Best-effort numeric coercion for exported cells.
///
/// A cell consisting solely of digits and at most decimal point / leading
/// sign becomes a JSON number; everything else stays a string.
pub fn coerce_cell(raw: &str) -> Value {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return Value::String(String::new());
    }
    let digits = candidate.strip_prefix('-').unwrap_or(candidate);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Value::String(raw.to_string());
    }
    if !digits.contains('.') {
        if let Ok(n) = candidate.parse::<i64>() {
            return Value::Number(n.into());
        }
    }
    match candidate.parse::<f64>() {
        Ok(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Convert raw sheet values (header row first) into export records.
///
/// Rows that are entirely empty are skipped. Rows shorter than the header
/// are padded with empty strings.
pub fn records_from_values(values: &[Vec<String>]) -> Vec<Map<String, Value>> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let keys: Vec<String> = header.iter().map(|label| title_to_snake(label)).collect();

    rows.iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| {
            keys.iter()
                .enumerate()
                .map(|(i, key)| {
                    let cell = row.get(i).map(String::as_str).unwrap_or("");
                    (key.clone(), coerce_cell(cell))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OrderPayload, OrderStatus, StatusRow};

    #[test]
    fn test_title_to_snake() {
        assert_eq!(title_to_snake("Client Name"), "client_name");
        assert_eq!(title_to_snake("Contact ID"), "contact_id");
        assert_eq!(title_to_snake("Card Last4"), "card_last4");
    }

    #[test]
    fn test_ledger_header_reverses_to_payload_fields() {
        // The export reversal must land on the payload's serde field names.
        assert_eq!(title_to_snake(ORDER_LEDGER_HEADER[0]), "contact_id");
        assert_eq!(title_to_snake(ORDER_LEDGER_HEADER[7]), "product_title");
        assert_eq!(title_to_snake(ORDER_LEDGER_HEADER[14]), "created_on");
        assert_eq!(title_to_snake(ORDER_LEDGER_HEADER[16]), "timestamp");
    }

    #[test]
    fn test_coerce_numeric_cell() {
        assert_eq!(coerce_cell("150.00"), serde_json::json!(150.0));
        assert_eq!(coerce_cell("42"), serde_json::json!(42));
        assert_eq!(coerce_cell("-7"), serde_json::json!(-7));
    }

    #[test]
    fn test_coerce_non_numeric_stays_string() {
        assert_eq!(coerce_cell("N/A"), serde_json::json!("N/A"));
        assert_eq!(coerce_cell("10/31/2025"), serde_json::json!("10/31/2025"));
        assert_eq!(coerce_cell("1.2.3"), serde_json::json!("1.2.3"));
        assert_eq!(coerce_cell(""), serde_json::json!(""));
    }

    #[test]
    fn test_records_skip_empty_rows_and_pad_short_ones() {
        let values = vec![
            vec!["Client Name".to_string(), "Price".to_string()],
            vec!["Dana".to_string(), "150.00".to_string()],
            vec!["".to_string(), "".to_string()],
            vec!["Riley".to_string()],
        ];
        let records = records_from_values(&values);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["client_name"], "Dana");
        assert_eq!(records[0]["price"], serde_json::json!(150.0));
        assert_eq!(records[1]["client_name"], "Riley");
        assert_eq!(records[1]["price"], "");
    }

    #[test]
    fn test_report_row_cells_land_under_their_headers() {
        let record = AppointmentRecord {
            appointment_id: "appt-1".to_string(),
            client_name: "Dana Reyes".to_string(),
            appointment_date: "10/11/2025".to_string(),
            service_name: "Consultation".to_string(),
            price: 150.0,
            client_id: "4821".to_string(),
            staff_id: "staff-9".to_string(),
            recurring_appointment_id: None,
        };
        let cells = report_row_cells(&record);
        assert_eq!(cells.len(), MONTHLY_REPORT_HEADER.len());
        assert_eq!(MONTHLY_REPORT_HEADER[2], "Appointment Date");
        assert_eq!(cells[2], "10/11/2025");
        assert_eq!(MONTHLY_REPORT_HEADER[4], "Client Name");
        assert_eq!(cells[4], "Dana Reyes");
        assert_eq!(MONTHLY_REPORT_HEADER[6], "Service Name");
        assert_eq!(cells[6], "Consultation");
        assert_eq!(MONTHLY_REPORT_HEADER[7], "Price");
        assert_eq!(cells[7], "150.00");
        // Hand-maintained columns stay blank.
        assert_eq!(cells[0], "");
        assert_eq!(cells[21], "");
    }

    #[test]
    fn test_status_row_cells_match_header_arity() {
        let row = StatusRow::new(
            &OrderPayload::default(),
            OrderStatus::Completed,
            chrono::Utc::now(),
        );
        assert_eq!(status_row_cells(&row).len(), ORDER_LEDGER_HEADER.len());
    }
}
