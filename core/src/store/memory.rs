use crate::error::{CoreError, CoreResult};
use crate::registry::model::{Claim, Evidence};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::LedgerStore;

struct StoredEvidence {
    evidence: Evidence,
    content: Option<Vec<u8>>,
    rank: u64,
}

#[derive(Default)]
struct EvidenceTable {
    items: HashMap<String, StoredEvidence>,
    next_rank: u64,
}

/// Process-local store. Each claim sits behind its own mutex so attachments
/// to one claim never contend with attachments to another.
#[derive(Default)]
pub struct InMemoryStore {
    claims: RwLock<HashMap<String, Arc<Mutex<Claim>>>>,
    evidence: RwLock<EvidenceTable>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_count(&self) -> usize {
        read(&self.claims).len()
    }

    pub fn evidence_count(&self) -> usize {
        read(&self.evidence).items.len()
    }

    fn claim_cell(&self, id: &str) -> CoreResult<Arc<Mutex<Claim>>> {
        read(&self.claims)
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::claim_not_found(id))
    }
}

// Every write is a single insertion or push, so a panic elsewhere cannot
// leave a half-applied update behind a poisoned lock.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl LedgerStore for InMemoryStore {
    fn put_claim(&self, claim: Claim) -> CoreResult<()> {
        let mut claims = write(&self.claims);
        if claims.contains_key(&claim.id) {
            return Err(CoreError::InvalidInput(format!(
                "claim id {} already exists",
                claim.id
            )));
        }
        claims.insert(claim.id.clone(), Arc::new(Mutex::new(claim)));
        Ok(())
    }

    fn get_claim(&self, id: &str) -> CoreResult<Claim> {
        let cell = self.claim_cell(id)?;
        let claim = cell.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(claim.clone())
    }

    fn put_evidence(&self, evidence: Evidence, content: Option<Vec<u8>>) -> CoreResult<()> {
        let mut table = write(&self.evidence);
        if table.items.contains_key(&evidence.id) {
            return Err(CoreError::InvalidInput(format!(
                "evidence id {} already exists",
                evidence.id
            )));
        }
        let rank = table.next_rank;
        table.next_rank += 1;
        table.items.insert(
            evidence.id.clone(),
            StoredEvidence {
                evidence,
                content,
                rank,
            },
        );
        Ok(())
    }

    fn get_evidence(&self, id: &str) -> CoreResult<Evidence> {
        read(&self.evidence)
            .items
            .get(id)
            .map(|s| s.evidence.clone())
            .ok_or_else(|| CoreError::evidence_not_found(id))
    }

    fn evidence_content(&self, id: &str) -> CoreResult<Option<Vec<u8>>> {
        read(&self.evidence)
            .items
            .get(id)
            .map(|s| s.content.clone())
            .ok_or_else(|| CoreError::evidence_not_found(id))
    }

    fn attach(&self, claim_id: &str, evidence_id: &str) -> CoreResult<bool> {
        if !read(&self.evidence).items.contains_key(evidence_id) {
            return Err(CoreError::evidence_not_found(evidence_id));
        }
        let cell = self.claim_cell(claim_id)?;
        let mut claim = cell.lock().unwrap_or_else(PoisonError::into_inner);
        if claim.has_evidence(evidence_id) {
            return Ok(false);
        }
        claim.evidence_ids.push(evidence_id.to_string());
        Ok(true)
    }

    fn registration_rank(&self, evidence_id: &str) -> Option<u64> {
        read(&self.evidence).items.get(evidence_id).map(|s| s.rank)
    }
}
