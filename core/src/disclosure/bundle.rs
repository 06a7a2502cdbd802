use crate::crypto::digest::{digest, is_hex_digest};
use crate::determinism::clock::now_rfc3339_utc;
use crate::determinism::ids::new_bundle_id;
use crate::error::{CoreError, CoreResult};
use crate::manifest::merkle::{build_manifest_for, merkle_root, Manifest, MANIFEST_VERSION};
use crate::registry::model::{Claim, Evidence};
use crate::registry::normalize::normalize_claim_text;
use crate::store::LedgerStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::license_gate::LicenseGate;

/// What to disclose: whole claims (with every attached evidence item) or a
/// bare evidence set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "select", content = "ids", rename_all = "snake_case")]
pub enum ExportSelection {
    Claims(Vec<String>),
    Evidence(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisclosureBundle {
    pub bundle_id: String,
    pub created_at: String,
    pub manifest: Manifest,
    pub claims: Vec<Claim>,
    /// Leaf order of `manifest`.
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleVerification {
    pub ok: bool,
    pub reasons: Vec<String>,
}

impl BundleVerification {
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            ok: reasons.is_empty(),
            reasons,
        }
    }

    pub fn merge(mut self, other: BundleVerification) -> Self {
        self.reasons.extend(other.reasons);
        self.ok = self.reasons.is_empty();
        self
    }
}

pub struct BundleExporter {
    store: Arc<dyn LedgerStore>,
    gate: LicenseGate,
}

impl BundleExporter {
    pub fn new(store: Arc<dyn LedgerStore>, gate: LicenseGate) -> Self {
        Self { store, gate }
    }

    /// Resolves the selection, runs the license gate, and only then builds the
    /// manifest. The gate is evaluated on every call; nothing is remembered
    /// between requests.
    pub fn export(&self, selection: &ExportSelection) -> CoreResult<DisclosureBundle> {
        let (claims, evidence) = self.resolve(selection)?;

        if let Err(denial) = self.gate.evaluate(&evidence) {
            warn!(
                violations = denial.violations.len(),
                "export denied by license policy"
            );
            return Err(CoreError::PolicyDenied(denial));
        }

        let manifest = build_manifest_for(&evidence);
        let bundle = DisclosureBundle {
            bundle_id: new_bundle_id(),
            created_at: now_rfc3339_utc(),
            manifest,
            claims,
            evidence,
        };
        info!(
            bundle_id = %bundle.bundle_id,
            root = %bundle.manifest.root,
            claims = bundle.claims.len(),
            evidence = bundle.evidence.len(),
            "disclosure bundle built"
        );
        Ok(bundle)
    }

    /// Claims in request order (deduplicated) and their evidence in
    /// registration order. The evidence list is taken once and is the same
    /// list the manifest is built from.
    pub fn resolve(&self, selection: &ExportSelection) -> CoreResult<(Vec<Claim>, Vec<Evidence>)> {
        let mut claims = Vec::new();
        let mut evidence_ids: Vec<String> = Vec::new();
        match selection {
            ExportSelection::Claims(ids) => {
                let mut seen_claims = HashSet::new();
                for id in ids {
                    if !seen_claims.insert(id.as_str()) {
                        continue;
                    }
                    let claim = self.store.get_claim(id)?;
                    evidence_ids.extend(claim.evidence_ids.iter().cloned());
                    claims.push(claim);
                }
            }
            ExportSelection::Evidence(ids) => evidence_ids.extend(ids.iter().cloned()),
        }

        let mut seen = HashSet::new();
        evidence_ids.retain(|id| seen.insert(id.clone()));
        let mut evidence = evidence_ids
            .iter()
            .map(|id| self.store.get_evidence(id))
            .collect::<CoreResult<Vec<_>>>()?;
        evidence.sort_by_cached_key(|e| {
            (
                self.store.registration_rank(&e.id).unwrap_or(u64::MAX),
                e.id.clone(),
            )
        });
        Ok((claims, evidence))
    }
}

/// Re-derives everything checkable from the bundle's own contents.
///
/// Nothing recorded in the bundle is trusted without recomputation, and every
/// problem found is reported.
pub fn verify_bundle(bundle: &DisclosureBundle) -> BundleVerification {
    let mut reasons = Vec::new();
    let manifest = &bundle.manifest;

    if manifest.version != MANIFEST_VERSION {
        reasons.push(format!(
            "unsupported manifest version {:?} (expected {:?})",
            manifest.version, MANIFEST_VERSION
        ));
    }

    let leaves: Vec<&str> = bundle.evidence.iter().map(|e| e.hash.as_str()).collect();
    let recomputed = merkle_root(&leaves);
    if recomputed != manifest.root {
        reasons.push(format!(
            "merkle root mismatch: manifest records {:?}, evidence recomputes to {:?}",
            manifest.root, recomputed
        ));
    }
    if !manifest.verify_self() {
        reasons.push(format!(
            "manifest chain does not reproduce root {:?}",
            manifest.root
        ));
    }

    if manifest.chain.len() != bundle.evidence.len() {
        reasons.push(format!(
            "manifest chain lists {} entries but bundle carries {} evidence items",
            manifest.chain.len(),
            bundle.evidence.len()
        ));
    }
    for (i, (entry, e)) in manifest.chain.iter().zip(&bundle.evidence).enumerate() {
        if entry.id != e.id {
            reasons.push(format!(
                "chain position {}: manifest lists evidence {} but bundle has {}",
                i, entry.id, e.id
            ));
        } else if entry.hash != e.hash {
            reasons.push(format!(
                "evidence {}: hash {} differs from manifest chain {}",
                e.id, e.hash, entry.hash
            ));
        }
    }

    let mut present = HashSet::new();
    for e in &bundle.evidence {
        if !present.insert(e.id.as_str()) {
            reasons.push(format!("evidence {} appears more than once", e.id));
        }
        if !is_hex_digest(&e.hash) {
            reasons.push(format!("evidence {}: hash is not a sha256 hex digest", e.id));
        }
    }

    for c in &bundle.claims {
        if digest(c.text.as_bytes()) != c.payload_hash {
            reasons.push(format!(
                "claim {}: payload_hash does not match claim text",
                c.id
            ));
        }
        if normalize_claim_text(&c.text) != c.normalized {
            reasons.push(format!(
                "claim {}: normalized text does not match claim text",
                c.id
            ));
        }
        for eid in &c.evidence_ids {
            if !present.contains(eid.as_str()) {
                reasons.push(format!(
                    "claim {}: attached evidence {} missing from bundle",
                    c.id, eid
                ));
            }
        }
    }

    BundleVerification::from_reasons(reasons)
}
