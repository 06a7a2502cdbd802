//! Corroboration scoring.
//!
//! Each attached evidence item contributes support according to how many
//! earlier items share its source domain: the first counts 1.0, every later
//! one counts `duplicate_domain_weight`. Support saturates through
//! `1 - exp(-support / saturation)` and is then scaled by independence:
//!
//! ```text
//! score = volume * (0.5 + 0.5 * distinct_domains / evidence_count)
//! ```
//!
//! Adding evidence from a new domain raises both factors, so the score never
//! drops. Adding evidence from a seen domain always leaves independence lower
//! than a new-domain addition would.

use crate::config::ScoringConfig;
use crate::registry::model::Evidence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::domain_key;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainCount {
    pub domain: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Breakdown {
    pub independence: f64,
    pub volume: f64,
    pub effective_support: f64,
    pub evidence_count: usize,
    pub distinct_domains: usize,
    /// Informational; does not enter the score.
    pub signed_fraction: f64,
    pub domains: Vec<DomainCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Corroboration {
    pub score: f64,
    pub breakdown: Breakdown,
}

#[derive(Debug, Clone)]
pub struct CorroborationScorer {
    cfg: ScoringConfig,
}

impl Default for CorroborationScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl CorroborationScorer {
    pub fn new(cfg: ScoringConfig) -> Self {
        Self { cfg }
    }

    pub fn score(&self, evidence: &[Evidence]) -> Corroboration {
        let mut per_domain: BTreeMap<String, usize> = BTreeMap::new();
        let mut effective_support = 0.0;
        for e in evidence {
            let seen = per_domain.entry(domain_key(e)).or_insert(0);
            effective_support += if *seen == 0 {
                1.0
            } else {
                self.cfg.duplicate_domain_weight
            };
            *seen += 1;
        }

        let evidence_count = evidence.len();
        let distinct_domains = per_domain.len();
        if evidence_count == 0 {
            return Corroboration {
                score: 0.0,
                breakdown: Breakdown {
                    independence: 0.0,
                    volume: 0.0,
                    effective_support: 0.0,
                    evidence_count: 0,
                    distinct_domains: 0,
                    signed_fraction: 0.0,
                    domains: Vec::new(),
                },
            };
        }

        let independence = clamp01(distinct_domains as f64 / evidence_count as f64);
        let volume = clamp01(1.0 - (-effective_support / self.cfg.saturation).exp());
        let score = clamp01(volume * (0.5 + 0.5 * independence));
        let signed = evidence.iter().filter(|e| e.signed).count();

        Corroboration {
            score,
            breakdown: Breakdown {
                independence,
                volume,
                effective_support,
                evidence_count,
                distinct_domains,
                signed_fraction: signed as f64 / evidence_count as f64,
                domains: per_domain
                    .into_iter()
                    .map(|(domain, count)| DomainCount { domain, count })
                    .collect(),
            },
        }
    }
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
