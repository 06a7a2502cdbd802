use crate::disclosure::license_gate::LicenseDenial;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("export denied: {0}")]
    PolicyDenied(LicenseDenial),

    #[error("integrity mismatch: {}", .0.join("; "))]
    IntegrityMismatch(Vec<String>),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("determinism violation: {0}")]
    DeterminismViolation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip error: {0}")]
    Zip(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl CoreError {
    pub fn claim_not_found(id: &str) -> Self {
        CoreError::NotFound {
            kind: "claim",
            id: id.to_string(),
        }
    }

    pub fn evidence_not_found(id: &str) -> Self {
        CoreError::NotFound {
            kind: "evidence",
            id: id.to_string(),
        }
    }

    /// Status code a transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            CoreError::NotFound { .. } => 404,
            CoreError::PolicyDenied(_) => 403,
            CoreError::InvalidInput(_) => 400,
            CoreError::IntegrityMismatch(_) => 409,
            _ => 500,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
