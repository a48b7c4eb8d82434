//! Idempotency fingerprints.
//!
//! A fingerprint identifies one logical gateway event. The transaction id
//! participates when present so two real charge attempts against the same
//! order (a failed attempt, then a successful retry) hash differently, while
//! redeliveries of the identical event always collapse to the same key.

use payhook_primitives::models::dtos::webhook_dto::ParsedPaymentEvent;
use sha2::{Digest, Sha256};

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn event_fingerprint(event: &ParsedPaymentEvent) -> String {
    let mut canonical = format!(
        "reference={}&status={}&amount={}",
        event.reference, event.external_status, event.amount_minor_units
    );
    if let Some(transaction_id) = &event.transaction_id {
        canonical.push_str("&transaction_id=");
        canonical.push_str(transaction_id);
    }

    sha256_hex(canonical.as_bytes())
}
