use crate::crypto::digest::digest;
use crate::determinism::clock::now_rfc3339_utc;
use crate::determinism::ids::new_claim_id;
use crate::error::{CoreError, CoreResult};
use crate::store::LedgerStore;
use std::sync::Arc;
use tracing::{debug, info};

use super::evidence::clean_transforms;
use super::model::{Claim, CreateClaim, Evidence};
use super::normalize::normalize_claim_text;

pub struct ClaimStore {
    store: Arc<dyn LedgerStore>,
}

impl ClaimStore {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, req: CreateClaim) -> CoreResult<Claim> {
        if req.text.trim().is_empty() {
            return Err(CoreError::InvalidInput("claim text cannot be empty".to_string()));
        }
        let actor = req.actor.trim();
        if actor.is_empty() {
            return Err(CoreError::InvalidInput("claim actor cannot be empty".to_string()));
        }

        let claim = Claim {
            id: new_claim_id(),
            normalized: normalize_claim_text(&req.text),
            payload_hash: digest(req.text.as_bytes()),
            embedding: req.embedding,
            created_at: now_rfc3339_utc(),
            source_uri: req.source_uri,
            connector: req.connector,
            transform_chain: clean_transforms(&req.transforms)?,
            actor: actor.to_string(),
            evidence_ids: Vec::new(),
            text: req.text,
        };
        self.store.put_claim(claim.clone())?;
        info!(claim_id = %claim.id, payload_hash = %claim.payload_hash, "claim created");
        Ok(claim)
    }

    /// Returns `true` when the edge is new; re-attaching is a no-op.
    pub fn attach(&self, claim_id: &str, evidence_id: &str) -> CoreResult<bool> {
        let added = self.store.attach(claim_id, evidence_id)?;
        if added {
            info!(%claim_id, %evidence_id, "evidence attached");
        } else {
            debug!(%claim_id, %evidence_id, "attachment already present");
        }
        Ok(added)
    }

    pub fn get(&self, id: &str) -> CoreResult<Claim> {
        self.store.get_claim(id)
    }

    /// Attached evidence in attachment order, read from one claim snapshot.
    pub fn evidence_for(&self, claim_id: &str) -> CoreResult<Vec<Evidence>> {
        let claim = self.store.get_claim(claim_id)?;
        claim
            .evidence_ids
            .iter()
            .map(|id| self.store.get_evidence(id))
            .collect()
    }
}
