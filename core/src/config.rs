use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DENIED_LICENSE_TERM: &str = "no-export";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LicensePolicyConfig {
    /// License clauses that block export, compared after normalization
    /// (lowercase, `_` and whitespace folded to `-`).
    pub denied_terms: Vec<String>,
}

impl Default for LicensePolicyConfig {
    fn default() -> Self {
        Self {
            denied_terms: vec![DEFAULT_DENIED_LICENSE_TERM.to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Support contributed by each evidence item after the first from the same domain.
    pub duplicate_domain_weight: f64,
    /// Support at which volume reaches `1 - 1/e`.
    pub saturation: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            duplicate_domain_weight: 0.25,
            saturation: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub license: LicensePolicyConfig,
    pub scoring: ScoringConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_log_path: Option<PathBuf>,
}

impl LedgerConfig {
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let bytes = fs::read(path.as_ref())?;
        let cfg: LedgerConfig = serde_json::from_slice(&bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let w = self.scoring.duplicate_domain_weight;
        if !(w > 0.0 && w < 1.0) {
            return Err(CoreError::InvalidInput(format!(
                "scoring.duplicate_domain_weight must be in (0, 1), got {}",
                w
            )));
        }
        let s = self.scoring.saturation;
        if !(s.is_finite() && s > 0.0) {
            return Err(CoreError::InvalidInput(format!(
                "scoring.saturation must be positive, got {}",
                s
            )));
        }
        if self.license.denied_terms.iter().any(|t| t.trim().is_empty()) {
            return Err(CoreError::InvalidInput(
                "license.denied_terms cannot contain empty terms".to_string(),
            ));
        }
        Ok(())
    }
}
