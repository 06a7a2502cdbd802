use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Url,
    File,
    Document,
    Dataset,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claim {
    pub id: String,
    pub text: String,
    pub normalized: String,
    pub payload_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: String,
    pub source_uri: Option<String>,
    pub connector: Option<String>,
    pub transform_chain: Vec<String>,
    pub actor: String,
    /// Attachment order, no duplicates.
    pub evidence_ids: Vec<String>,
}

impl Claim {
    pub fn has_evidence(&self, evidence_id: &str) -> bool {
        self.evidence_ids.iter().any(|e| e == evidence_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evidence {
    pub id: String,
    pub kind: EvidenceKind,
    pub title: Option<String>,
    pub url: Option<String>,
    pub hash: String,
    pub mime: String,
    pub created_at: String,
    pub signed: bool,
    pub signer_fingerprint: Option<String>,
    pub license_terms: Option<String>,
    pub license_owner: Option<String>,
    pub source_uri: Option<String>,
    pub connector: Option<String>,
    pub transform_chain: Vec<String>,
    pub actor: String,
}

/// Boundary request for `evidence.register`.
///
/// `signature` and `public_key` are hex or standard base64 text.
#[derive(Debug, Clone)]
pub struct RegisterEvidence {
    pub kind: EvidenceKind,
    pub url: Option<String>,
    pub content: Option<Vec<u8>>,
    pub title: Option<String>,
    pub mime: Option<String>,
    pub signature: Option<String>,
    pub public_key: Option<String>,
    pub license_terms: Option<String>,
    pub license_owner: Option<String>,
    pub source_uri: Option<String>,
    pub connector: Option<String>,
    pub transforms: Vec<String>,
    pub actor: String,
}

impl RegisterEvidence {
    pub fn new(kind: EvidenceKind, actor: impl Into<String>) -> Self {
        Self {
            kind,
            url: None,
            content: None,
            title: None,
            mime: None,
            signature: None,
            public_key: None,
            license_terms: None,
            license_owner: None,
            source_uri: None,
            connector: None,
            transforms: Vec::new(),
            actor: actor.into(),
        }
    }

    pub fn url(kind: EvidenceKind, url: impl Into<String>, actor: impl Into<String>) -> Self {
        let mut r = Self::new(kind, actor);
        r.url = Some(url.into());
        r
    }

    /// Bytes the digest and any signature cover: content, else the URL, else nothing.
    pub fn payload_bytes(&self) -> &[u8] {
        if let Some(c) = &self.content {
            return c;
        }
        if let Some(u) = &self.url {
            return u.as_bytes();
        }
        &[]
    }
}

/// Boundary request for `claims.create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClaim {
    pub text: String,
    #[serde(default)]
    pub source_uri: Option<String>,
    #[serde(default)]
    pub connector: Option<String>,
    #[serde(default)]
    pub transforms: Vec<String>,
    pub actor: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl CreateClaim {
    pub fn new(text: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_uri: None,
            connector: None,
            transforms: Vec::new(),
            actor: actor.into(),
            embedding: None,
        }
    }
}
