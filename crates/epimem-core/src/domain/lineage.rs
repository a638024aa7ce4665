//! Decision lineage (spec §3, Glossary).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::mean;

/// A claim that was used to reach a decision, with its weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedClaim {
    pub claim_id: String,
    pub weight: f64,
}

/// A claim that was considered and rejected, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedClaim {
    pub claim_id: String,
    pub reason: String,
}

/// The full provenance record for a decision (spec §3 "Decision lineage").
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionLineage {
    pub decision_id: String,
    pub tenant_id: String,
    pub decision: String,
    pub claims_used: Vec<UsedClaim>,
    pub claims_rejected: Vec<RejectedClaim>,
    pub conflicts_unresolved: Vec<String>,
    pub confidence_score: f64,
    pub reasoning: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl DecisionLineage {
    /// `confidence_score = mean(weights of claims_used)`, or 0 if none
    /// (spec §3 invariant).
    pub fn confidence_from_used(claims_used: &[UsedClaim]) -> f64 {
        if claims_used.is_empty() {
            0.0
        } else {
            mean(&claims_used.iter().map(|c| c.weight).collect::<Vec<_>>())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_zero_with_no_claims_used() {
        assert_eq!(DecisionLineage::confidence_from_used(&[]), 0.0);
    }

    #[test]
    fn confidence_is_mean_of_weights() {
        let used = vec![
            UsedClaim { claim_id: "a".into(), weight: 0.8 },
            UsedClaim { claim_id: "b".into(), weight: 0.6 },
        ];
        assert!((DecisionLineage::confidence_from_used(&used) - 0.7).abs() < 1e-9);
    }
}
