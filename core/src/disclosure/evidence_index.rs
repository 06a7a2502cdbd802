use crate::error::CoreResult;
use crate::registry::model::{Evidence, EvidenceKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceIndexRow {
    pub evidence_id: String,
    pub sha256: String,
    pub mime: String,
    pub kind: EvidenceKind,
    pub signed: bool,
    pub license_owner: String,
    pub license_terms: String,
}

impl From<&Evidence> for EvidenceIndexRow {
    fn from(e: &Evidence) -> Self {
        Self {
            evidence_id: e.id.clone(),
            sha256: e.hash.clone(),
            mime: e.mime.clone(),
            kind: e.kind,
            signed: e.signed,
            license_owner: e.license_owner.clone().unwrap_or_default(),
            license_terms: e.license_terms.clone().unwrap_or_default(),
        }
    }
}

/// Human-readable index shipped next to a written bundle, sorted by evidence
/// id, `\n` line endings.
pub fn render_evidence_index_csv(evidence: &[Evidence]) -> CoreResult<String> {
    let mut rows: Vec<EvidenceIndexRow> = evidence.iter().map(EvidenceIndexRow::from).collect();
    rows.sort_by(|a, b| a.evidence_id.cmp(&b.evidence_id));

    let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
    for r in rows {
        wtr.serialize(r)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).replace("\r\n", "\n"))
}
