use crate::crypto::digest::digest;
use crate::crypto::signature::{check_encoded_signature, SignatureStatus};
use crate::determinism::clock::now_rfc3339_utc;
use crate::determinism::ids::new_evidence_id;
use crate::error::{CoreError, CoreResult};
use crate::store::LedgerStore;
use std::sync::Arc;
use tracing::{info, warn};

use super::model::{Evidence, RegisterEvidence};

pub const MIME_OCTET_STREAM: &str = "application/octet-stream";
pub const MIME_URI_LIST: &str = "text/uri-list";

/// Append-only registry of content-addressed evidence.
pub struct EvidenceRegistry {
    store: Arc<dyn LedgerStore>,
}

#[derive(Debug, Clone)]
pub struct Registered {
    pub evidence: Evidence,
    pub signature: SignatureStatus,
}

impl EvidenceRegistry {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn register(&self, req: RegisterEvidence) -> CoreResult<Evidence> {
        self.register_detailed(req).map(|r| r.evidence)
    }

    /// Like [`register`](Self::register) but also reports why a supplied
    /// signature did or did not verify.
    pub fn register_detailed(&self, req: RegisterEvidence) -> CoreResult<Registered> {
        let actor = req.actor.trim();
        if actor.is_empty() {
            return Err(CoreError::InvalidInput("evidence actor cannot be empty".to_string()));
        }
        let transform_chain = clean_transforms(&req.transforms)?;

        let payload = req.payload_bytes();
        let hash = digest(payload);
        let signature = check_encoded_signature(
            req.public_key.as_deref(),
            payload,
            req.signature.as_deref(),
        );

        let id = new_evidence_id();
        match &signature {
            SignatureStatus::Malformed { reason } => {
                warn!(evidence_id = %id, %reason, "malformed signature, registering as unsigned")
            }
            SignatureStatus::Invalid => {
                warn!(evidence_id = %id, "signature did not verify, registering as unsigned")
            }
            _ => {}
        }

        let mime = req.mime.clone().unwrap_or_else(|| {
            if req.content.is_none() && req.url.is_some() {
                MIME_URI_LIST.to_string()
            } else {
                MIME_OCTET_STREAM.to_string()
            }
        });

        let evidence = Evidence {
            id,
            kind: req.kind,
            title: req.title,
            url: req.url,
            hash,
            mime,
            created_at: now_rfc3339_utc(),
            signed: signature.is_verified(),
            signer_fingerprint: signature.signer_fingerprint().map(str::to_string),
            license_terms: req.license_terms,
            license_owner: req.license_owner,
            source_uri: req.source_uri,
            connector: req.connector,
            transform_chain,
            actor: actor.to_string(),
        };

        self.store.put_evidence(evidence.clone(), req.content)?;
        info!(
            evidence_id = %evidence.id,
            hash = %evidence.hash,
            signed = evidence.signed,
            "evidence registered"
        );
        Ok(Registered {
            evidence,
            signature,
        })
    }

    pub fn get(&self, id: &str) -> CoreResult<Evidence> {
        self.store.get_evidence(id)
    }
}

pub(crate) fn clean_transforms(transforms: &[String]) -> CoreResult<Vec<String>> {
    transforms
        .iter()
        .map(|t| {
            let t = t.trim();
            if t.is_empty() {
                Err(CoreError::InvalidInput("transform names cannot be empty".to_string()))
            } else {
                Ok(t.to_string())
            }
        })
        .collect()
}
