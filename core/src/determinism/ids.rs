use ulid::Ulid;

pub const CLAIM_ID_PREFIX: &str = "c_";
pub const EVIDENCE_ID_PREFIX: &str = "e_";
pub const BUNDLE_ID_PREFIX: &str = "b_";

pub fn new_claim_id() -> String {
    format!("{}{}", CLAIM_ID_PREFIX, Ulid::new())
}

pub fn new_evidence_id() -> String {
    format!("{}{}", EVIDENCE_ID_PREFIX, Ulid::new())
}

pub fn new_bundle_id() -> String {
    format!("{}{}", BUNDLE_ID_PREFIX, Ulid::new())
}
