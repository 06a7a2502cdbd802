use crate::config::LicensePolicyConfig;
use crate::registry::model::Evidence;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LicenseViolation {
    pub evidence_id: String,
    pub owner: String,
    pub terms: String,
}

/// Why an export was refused. Owner and terms are kept exactly as registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LicenseDenial {
    pub violations: Vec<LicenseViolation>,
}

impl fmt::Display for LicenseDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(
                f,
                "evidence {} licensed by {} under terms \"{}\"",
                v.evidence_id, v.owner, v.terms
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LicenseGate {
    denied_terms: Vec<String>,
}

impl Default for LicenseGate {
    fn default() -> Self {
        Self::new(&LicensePolicyConfig::default())
    }
}

impl LicenseGate {
    pub fn new(cfg: &LicensePolicyConfig) -> Self {
        Self {
            denied_terms: cfg.denied_terms.iter().map(|t| normalize_clause(t)).collect(),
        }
    }

    /// True when any `,`/`;` separated clause of `terms` is a denied term.
    pub fn terms_deny_export(&self, terms: &str) -> bool {
        terms
            .split([',', ';'])
            .map(normalize_clause)
            .any(|clause| !clause.is_empty() && self.denied_terms.contains(&clause))
    }

    /// Fails closed: any item with denying terms and an owner blocks the
    /// whole set. Every offender is reported.
    pub fn evaluate(&self, evidence: &[Evidence]) -> Result<(), LicenseDenial> {
        let mut violations = Vec::new();
        for e in evidence {
            let (Some(terms), Some(owner)) = (&e.license_terms, &e.license_owner) else {
                continue;
            };
            if terms.trim().is_empty() || owner.trim().is_empty() {
                continue;
            }
            if self.terms_deny_export(terms) {
                violations.push(LicenseViolation {
                    evidence_id: e.id.clone(),
                    owner: owner.clone(),
                    terms: terms.clone(),
                });
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(LicenseDenial { violations })
        }
    }
}

fn normalize_clause(clause: &str) -> String {
    clause
        .trim()
        .to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
