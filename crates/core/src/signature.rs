//! Webhook signature verification.
//!
//! Gateways disagree on what exactly gets signed, so two canonicalization
//! modes are supported: the raw request body as received, and a deterministic
//! `key=value&...` string over the flat payload fields with keys sorted
//! lexicographically. Either one matching accepts the delivery. Both modes
//! are HMAC-SHA-256 over the shared secret, hex-encoded, and compared in
//! constant time.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA-256 over `canonical`, hex-encoded. HMAC accepts keys of any
/// length, so this only returns `None` on a broken `hmac` build.
pub fn compute_signature(secret: &str, canonical: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(canonical);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Deterministic signing string for the field-map mode: keys sorted
/// lexicographically, scalar values rendered bare, joined as `k=v&k=v`.
pub fn canonical_field_string(fields: &Map<String, Value>) -> String {
    let mut pairs: Vec<(&String, String)> = fields
        .iter()
        .map(|(k, v)| (k, scalar_text(v)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn constant_time_matches(expected: &str, declared: &str) -> bool {
    expected
        .as_bytes()
        .ct_eq(declared.as_bytes())
        .unwrap_u8()
        == 1
}

/// Body-mode check: the signature covers the exact bytes received.
pub fn verify_body_signature(secret: &str, body: &[u8], declared: &str) -> bool {
    match compute_signature(secret, body) {
        Some(expected) => constant_time_matches(&expected, declared),
        None => false,
    }
}

/// Field-mode check: the signature covers the sorted `k=v&...` string.
pub fn verify_field_signature(secret: &str, fields: &Map<String, Value>, declared: &str) -> bool {
    let canonical = canonical_field_string(fields);
    match compute_signature(secret, canonical.as_bytes()) {
        Some(expected) => constant_time_matches(&expected, declared),
        None => false,
    }
}

/// Accepts the delivery if either canonicalization mode verifies. A missing
/// secret or missing declared signature is an ordinary failure, never a
/// panic.
pub fn verify_signature(
    secret: Option<&SecretString>,
    body: &[u8],
    fields: Option<&Map<String, Value>>,
    declared: Option<&str>,
) -> bool {
    let (Some(secret), Some(declared)) = (secret, declared) else {
        return false;
    };
    let secret = secret.expose_secret();

    if verify_body_signature(secret, body, declared) {
        return true;
    }

    fields
        .map(|map| verify_field_signature(secret, map, declared))
        .unwrap_or(false)
}
