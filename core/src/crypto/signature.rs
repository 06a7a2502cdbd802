//! Ed25519 verification of evidence payloads.
//!
//! Verification never errors. Anything that cannot be checked is reported as
//! a [`SignatureStatus`] so registration can continue with `signed = false`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH};
use serde::{Deserialize, Serialize};

use super::digest::digest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignatureStatus {
    /// No signature or no public key was supplied.
    Absent,
    Verified { signer_fingerprint: String },
    /// Well-formed key and signature, but the signature does not match.
    Invalid,
    /// Key or signature could not be decoded.
    Malformed { reason: String },
}

impl SignatureStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, SignatureStatus::Verified { .. })
    }

    pub fn signer_fingerprint(&self) -> Option<&str> {
        match self {
            SignatureStatus::Verified { signer_fingerprint } => Some(signer_fingerprint),
            _ => None,
        }
    }
}

/// `sha256:<hex>` over the raw public key bytes.
pub fn fingerprint(public_key: &[u8]) -> String {
    format!("sha256:{}", digest(public_key))
}

/// Returns `(is_valid, signer_fingerprint)`; `(false, None)` for any failure.
pub fn verify_signature(
    public_key: &[u8],
    payload: &[u8],
    signature: &[u8],
) -> (bool, Option<String>) {
    match check_signature(public_key, payload, signature) {
        SignatureStatus::Verified { signer_fingerprint } => (true, Some(signer_fingerprint)),
        _ => (false, None),
    }
}

pub fn check_signature(public_key: &[u8], payload: &[u8], signature: &[u8]) -> SignatureStatus {
    let key_bytes: [u8; PUBLIC_KEY_LENGTH] = match public_key.try_into() {
        Ok(b) => b,
        Err(_) => {
            return SignatureStatus::Malformed {
                reason: format!(
                    "public key must be {} bytes, got {}",
                    PUBLIC_KEY_LENGTH,
                    public_key.len()
                ),
            }
        }
    };
    let key = match VerifyingKey::from_bytes(&key_bytes) {
        Ok(k) => k,
        Err(e) => {
            return SignatureStatus::Malformed {
                reason: format!("invalid public key: {}", e),
            }
        }
    };
    let sig = match Signature::from_slice(signature) {
        Ok(s) => s,
        Err(e) => {
            return SignatureStatus::Malformed {
                reason: format!("invalid signature encoding: {}", e),
            }
        }
    };
    match key.verify_strict(payload, &sig) {
        Ok(()) => SignatureStatus::Verified {
            signer_fingerprint: fingerprint(public_key),
        },
        Err(_) => SignatureStatus::Invalid,
    }
}

/// Checks a signature whose key and signature arrived as text (hex or
/// standard base64).
pub fn check_encoded_signature(
    public_key: Option<&str>,
    payload: &[u8],
    signature: Option<&str>,
) -> SignatureStatus {
    let (Some(key_text), Some(sig_text)) = (public_key, signature) else {
        return SignatureStatus::Absent;
    };
    let Some(key) = decode_key_material(key_text) else {
        return SignatureStatus::Malformed {
            reason: "public key is neither hex nor base64".to_string(),
        };
    };
    let Some(sig) = decode_key_material(sig_text) else {
        return SignatureStatus::Malformed {
            reason: "signature is neither hex nor base64".to_string(),
        };
    };
    check_signature(&key, payload, &sig)
}

/// Hex is tried first; a string that is valid hex is never reinterpreted as base64.
pub fn decode_key_material(s: &str) -> Option<Vec<u8>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.len() % 2 == 0 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(s).ok();
    }
    BASE64.decode(s).ok()
}
