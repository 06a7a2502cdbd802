//! Merkle manifests over ordered evidence digests.
//!
//! Version "1" node rule: `hex(sha256(left_hex || right_hex))` over the ASCII
//! hex strings. An odd level duplicates its last node. No leaves gives the
//! empty root `""`; a single leaf is its own root.
//!
//! Leaves and inner nodes hash the same way, so with last-node duplication a
//! chain and the same chain with its last entry repeated share a root
//! (`[a, b, c]` and `[a, b, c, c]`). The root alone does not pin the leaf
//! count. Bundle verification also checks the chain length against the
//! evidence list and rejects repeated evidence ids; anything that checks only
//! the root must do the same.

use crate::crypto::digest::digest;
use crate::determinism::json_canonical::to_canonical_bytes;
use crate::error::CoreResult;
use crate::registry::model::Evidence;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MANIFEST_VERSION: &str = "1";
pub const EMPTY_ROOT: &str = "";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainEntry {
    pub id: String,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub version: String,
    pub root: String,
    pub chain: Vec<ChainEntry>,
}

pub fn merkle_root<S: AsRef<str>>(leaves: &[S]) -> String {
    if leaves.is_empty() {
        return EMPTY_ROOT.to_string();
    }
    let mut level: Vec<String> = leaves.iter().map(|l| l.as_ref().to_string()).collect();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            if let Some(last) = level.last().cloned() {
                level.push(last);
            }
        }
        level = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }
    level.pop().unwrap_or_default()
}

fn hash_pair(left: &str, right: &str) -> String {
    let mut buf = Vec::with_capacity(left.len() + right.len());
    buf.extend_from_slice(left.as_bytes());
    buf.extend_from_slice(right.as_bytes());
    digest(&buf)
}

/// Leaves are taken in the order given; callers own that order.
pub fn build_manifest(chain: Vec<ChainEntry>) -> Manifest {
    let leaves: Vec<&str> = chain.iter().map(|c| c.hash.as_str()).collect();
    let root = merkle_root(&leaves);
    debug!(leaves = chain.len(), %root, "manifest built");
    Manifest {
        version: MANIFEST_VERSION.to_string(),
        root,
        chain,
    }
}

pub fn build_manifest_for(evidence: &[Evidence]) -> Manifest {
    build_manifest(
        evidence
            .iter()
            .map(|e| ChainEntry {
                id: e.id.clone(),
                hash: e.hash.clone(),
            })
            .collect(),
    )
}

impl Manifest {
    pub fn recompute_root(&self) -> String {
        let leaves: Vec<&str> = self.chain.iter().map(|c| c.hash.as_str()).collect();
        merkle_root(&leaves)
    }

    pub fn verify_self(&self) -> bool {
        self.recompute_root() == self.root
    }

    /// Canonical JSON with the persisted field names `version`, `root`, `chain`.
    pub fn to_json_bytes(&self) -> CoreResult<Vec<u8>> {
        to_canonical_bytes(self)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
