//! `ConflictObject` — a typed, severity-scored contradiction (spec §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::text::clip;

/// Closed set of conflict kinds the consistency checker can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    MultipleHighConfidence,
    SemanticContradiction,
    RelationConflict,
}

/// A detected contradiction — never a free-form message (spec §3, Glossary).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictObject {
    pub id: String,
    pub tenant_id: String,
    pub entity_id: String,
    pub conflict_type: ConflictType,
    pub conflicting_relations: Vec<String>,
    pub severity_score: f64,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub detected_at: DateTime<Utc>,
}

impl ConflictObject {
    /// `severity = min(confidences) · mean(confidences)` for >= 2
    /// conflicting relations, else 0 (spec §3 invariant).
    pub fn severity(confidences: &[f64]) -> f64 {
        if confidences.len() < 2 {
            return 0.0;
        }
        let min = confidences.iter().cloned().fold(f64::INFINITY, f64::min);
        let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
        clip(min * mean, 0.0, 1.0)
    }

    pub fn new(
        tenant_id: impl Into<String>,
        entity_id: impl Into<String>,
        conflict_type: ConflictType,
        conflicting_relations: Vec<String>,
        confidences: &[f64],
    ) -> Self {
        Self {
            id: format!("conflict_{}", uuid::Uuid::new_v4()),
            tenant_id: tenant_id.into(),
            entity_id: entity_id.into(),
            conflict_type,
            conflicting_relations,
            severity_score: Self::severity(confidences),
            metadata: HashMap::new(),
            detected_at: Utc::now(),
        }
    }

    /// Severity bucket for the self-audit summary (spec §4.O): `<0.4`,
    /// `<0.7`, `>=0.7`.
    pub fn severity_bucket(&self) -> &'static str {
        if self.severity_score < 0.4 {
            "low"
        } else if self.severity_score < 0.7 {
            "medium"
        } else {
            "high"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_zero_with_fewer_than_two() {
        assert_eq!(ConflictObject::severity(&[]), 0.0);
        assert_eq!(ConflictObject::severity(&[0.8]), 0.0);
    }

    #[test]
    fn severity_matches_formula() {
        // spec §8 scenario 3: 0.78 * 0.70 -> min*mean ~= 0.52
        let s = ConflictObject::severity(&[0.78, 0.70]);
        assert!((s - 0.52).abs() < 0.01, "got {s}");
    }

    #[test]
    fn severity_is_bounded() {
        let s = ConflictObject::severity(&[1.0, 1.0, 1.0]);
        assert!((0.0..=1.0).contains(&s));
    }
}
