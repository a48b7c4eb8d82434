//! Payload decoding, field validation, and sanitization.
//!
//! Validation collects every violation before returning so one audit entry
//! carries the complete diagnostic, and bad input is always a value-level
//! result, never a panic or early exit.

use chrono::{DateTime, Utc};
use payhook_primitives::models::dtos::webhook_dto::ParsedPaymentEvent;
use payhook_primitives::models::entities::enum_types::ExternalStatus;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use uuid::Uuid;

pub const ERR_INVALID_JSON: &str = "Invalid JSON payload";
pub const ERR_INVALID_AMOUNT: &str = "Invalid amount format";

const REQUIRED_FIELDS: [&str; 3] = ["Reference", "Status", "Amount"];

/// Decode a request body into a flat field map. Gateways sometimes
/// double-encode, so a JSON string that itself decodes to an object is
/// accepted too.
pub fn decode_object(raw: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(raw).ok()? {
        Value::Object(map) => Some(map),
        Value::String(inner) => match serde_json::from_str::<Value>(&inner).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Validate a decoded payload into a typed event, reporting all violations
/// together.
pub fn validate_payload(
    fields: &Map<String, Value>,
    received_at: DateTime<Utc>,
) -> Result<ParsedPaymentEvent, Vec<String>> {
    let mut errors = Vec::new();

    for name in REQUIRED_FIELDS {
        if is_missing(fields.get(name)) {
            errors.push(format!("Missing required field: {name}"));
        }
    }

    let reference = match fields.get("Reference") {
        Some(value) if !is_missing(Some(value)) => match scalar_string(Some(value)) {
            Some(reference) => Some(reference),
            None => {
                errors.push("Invalid reference format".to_string());
                None
            }
        },
        _ => None,
    };

    let external_status = match fields.get("Status") {
        Some(Value::String(raw)) if !raw.is_empty() => match ExternalStatus::from_str(raw) {
            Ok(status) => Some(status),
            Err(_) => {
                errors.push(format!("Invalid status: {raw}"));
                None
            }
        },
        Some(value) if !is_missing(Some(value)) => {
            errors.push(format!("Invalid status: {value}"));
            None
        }
        _ => None,
    };

    let amount_minor_units = match fields.get("Amount") {
        Some(value) if !is_missing(Some(value)) => match amount_minor_units(value) {
            Some(amount) => Some(amount),
            None => {
                errors.push(ERR_INVALID_AMOUNT.to_string());
                None
            }
        },
        _ => None,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    match (reference, external_status, amount_minor_units) {
        (Some(reference), Some(external_status), Some(amount_minor_units)) => {
            Ok(ParsedPaymentEvent {
                reference,
                transaction_id: scalar_string(fields.get("TransactionID")),
                external_status,
                amount_minor_units,
                occurred_at: occurred_at(fields).unwrap_or(received_at),
                response_text: scalar_string(fields.get("ResponseText"))
                    .or_else(|| scalar_string(fields.get("StatusText"))),
            })
        }
        // Unreachable: every None above pushed an error.
        _ => Err(vec![ERR_INVALID_JSON.to_string()]),
    }
}

/// Convenience entry point over raw bytes.
pub fn parse_webhook_payload(
    raw: &[u8],
    received_at: DateTime<Utc>,
) -> Result<ParsedPaymentEvent, Vec<String>> {
    match decode_object(raw) {
        Some(fields) => validate_payload(&fields, received_at),
        None => Err(vec![ERR_INVALID_JSON.to_string()]),
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Amounts arrive in minor units, usually as a decimal string. Negative and
/// non-numeric values are invalid; fractional values round to the nearest
/// unit.
fn amount_minor_units(value: &Value) -> Option<i64> {
    let amount = match value {
        Value::String(raw) => Decimal::from_str(raw.trim()).ok()?,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                Decimal::try_from(n.as_f64()?).ok()?
            }
        }
        _ => return None,
    };

    if amount.is_sign_negative() {
        return None;
    }

    amount.round().to_i64()
}

fn occurred_at(fields: &Map<String, Value>) -> Option<DateTime<Utc>> {
    let raw = fields.get("TransactionDate")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Mask card numbers to first-none/last-four before anything is logged or
/// persisted.
pub fn mask_card_number(card: &str) -> String {
    if card.len() <= 4 {
        return "*".repeat(card.len());
    }
    format!("{}{}", "*".repeat(card.len() - 4), &card[card.len() - 4..])
}

/// Copy of the payload safe for logging and persistence.
pub fn sanitize_payload(fields: &Map<String, Value>) -> Value {
    let mut sanitized = fields.clone();
    if let Some(Value::String(card)) = sanitized.get("CardNumber").cloned() {
        sanitized.insert("CardNumber".into(), Value::String(mask_card_number(&card)));
    }
    Value::Object(sanitized)
}

/// Some reference formats wrap the order identifier in prefix/suffix codes;
/// scan for a UUID-shaped substring so those still resolve.
pub fn extract_order_id(reference: &str) -> Option<Uuid> {
    const UUID_LEN: usize = 36;

    if reference.len() < UUID_LEN {
        return None;
    }

    // A 36-character window only parses in the hyphenated form, so a bare
    // 32-hex run inside a longer token is never mistaken for an order id.
    (0..=reference.len() - UUID_LEN)
        .filter_map(|start| reference.get(start..start + UUID_LEN))
        .find_map(|candidate| Uuid::try_parse(candidate).ok())
}
