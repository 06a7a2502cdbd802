use crate::crypto::digest::{digest, is_hex_digest};
use crate::determinism::json_canonical;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEvent {
    pub ts_utc: String, // RFC3339 UTC
    pub event_type: String,
    pub actor: String,
    /// Claim, evidence, or bundle id the event is about.
    pub subject_id: String,
    pub details: serde_json::Value,
    pub prev_event_hash: String, // hex 64
    pub event_hash: String,      // hex 64
}

pub const ZERO_HASH_64: &str = "0000000000000000000000000000000000000000000000000000000000000000";

impl AuditEvent {
    pub fn new(
        event_type: &str,
        actor: &str,
        subject_id: &str,
        ts_utc: String,
        details: serde_json::Value,
    ) -> Self {
        Self {
            ts_utc,
            event_type: event_type.to_string(),
            actor: actor.to_string(),
            subject_id: subject_id.to_string(),
            details,
            prev_event_hash: String::new(),
            event_hash: String::new(),
        }
    }
}

// event_hash covers the canonical bytes of the whole envelope with event_hash
// itself set to ZERO_HASH_64, so no key is ever omitted from the hashed form.
pub fn compute_event_hash(event: &AuditEvent) -> CoreResult<String> {
    let mut e = event.clone();
    e.event_hash = ZERO_HASH_64.to_string();
    let bytes = json_canonical::to_canonical_bytes(&e)?;
    Ok(digest(&bytes))
}

pub fn finalize_event(mut event: AuditEvent) -> CoreResult<AuditEvent> {
    if !is_hex_digest(&event.prev_event_hash) {
        return Err(CoreError::InvalidInput(
            "prev_event_hash must be 64 lowercase hex chars".to_string(),
        ));
    }
    validate_event_taxonomy(&event)?;
    event.event_hash = compute_event_hash(&event)?;
    Ok(event)
}

fn validate_event_taxonomy(event: &AuditEvent) -> CoreResult<()> {
    let Some(required) = required_detail_keys(&event.event_type) else {
        return Err(CoreError::InvalidInput(format!(
            "unknown event_type {}",
            event.event_type
        )));
    };
    for k in required {
        if event.details.get(k).is_none() {
            return Err(CoreError::InvalidInput(format!(
                "event {} missing details.{}",
                event.event_type, k
            )));
        }
    }
    Ok(())
}

fn required_detail_keys(event_type: &str) -> Option<&'static [&'static str]> {
    let keys: &'static [&'static str] = match event_type {
        "EVIDENCE_REGISTERED" => &["hash", "kind", "signed", "signature_status"],
        "CLAIM_CREATED" => &["payload_hash"],
        "EVIDENCE_ATTACHED" => &["evidence_id", "added"],
        "EXPORT_REQUESTED" => &["selection"],
        "EXPORT_DENIED" => &["violations"],
        "EXPORT_COMPLETED" => &["manifest_root", "claim_count", "evidence_count"],
        "BUNDLE_VERIFIED" => &["ok", "reasons"],
        _ => return None,
    };
    Some(keys)
}
