//! Storage seam for the ledger.
//!
//! Components receive a `LedgerStore` instead of reaching for shared state, so
//! independent ledgers can live side by side (tests run one per case).

pub mod memory;

use crate::error::CoreResult;
use crate::registry::model::{Claim, Evidence};

pub use memory::InMemoryStore;

pub trait LedgerStore: Send + Sync {
    /// Inserts a new claim. Ids are never reused; a duplicate id is `InvalidInput`.
    fn put_claim(&self, claim: Claim) -> CoreResult<()>;

    /// Snapshot of the claim as of the call.
    fn get_claim(&self, id: &str) -> CoreResult<Claim>;

    /// Inserts new evidence together with the bytes it was hashed from, when
    /// those bytes were supplied as content.
    fn put_evidence(&self, evidence: Evidence, content: Option<Vec<u8>>) -> CoreResult<()>;

    fn get_evidence(&self, id: &str) -> CoreResult<Evidence>;

    fn evidence_content(&self, id: &str) -> CoreResult<Option<Vec<u8>>>;

    /// Adds the `(claim_id, evidence_id)` edge. Returns `false` if it already
    /// existed. Concurrent calls for one claim are serialized; calls for
    /// different claims do not wait on each other.
    fn attach(&self, claim_id: &str, evidence_id: &str) -> CoreResult<bool>;

    /// Position of the evidence in registration order, starting at 0.
    fn registration_rank(&self, evidence_id: &str) -> Option<u64>;
}
