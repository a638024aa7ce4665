//! Consistency checker (spec §4.J).

use std::collections::HashMap;

use crate::domain::{ConflictObject, ConflictType, Relation};
use crate::error::Result;
use crate::store::StoreFacade;
use crate::text::has_negation;

/// `confidence >= 0.6` triggers a `multiple_high_confidence` conflict
/// when at least two relations in a group clear it (spec §4.J).
const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Per-entity conflict detection (spec §4.J): group relations by type;
/// within each group emit `multiple_high_confidence` when >=2 relations
/// clear the threshold, then split targets into negated/positive and emit
/// `semantic_contradiction` when both sides are non-empty.
pub fn check_entity(tenant_id: &str, entity_id: &str, relations: &[Relation]) -> Vec<ConflictObject> {
    let mut groups: HashMap<&str, Vec<&Relation>> = HashMap::new();
    for relation in relations {
        groups.entry(relation.relation.as_str()).or_default().push(relation);
    }

    let mut conflicts = Vec::new();

    for group in groups.values() {
        let high_confidence: Vec<&&Relation> = group.iter().filter(|r| r.confidence >= HIGH_CONFIDENCE_THRESHOLD).collect();
        if high_confidence.len() >= 2 {
            let confidences: Vec<f64> = high_confidence.iter().map(|r| r.confidence).collect();
            let ids: Vec<String> = high_confidence.iter().map(|r| r.id.clone()).collect();
            conflicts.push(ConflictObject::new(tenant_id, entity_id, ConflictType::MultipleHighConfidence, ids, &confidences));
        }

        let (negated, positive): (Vec<&&Relation>, Vec<&&Relation>) = group.iter().partition(|r| has_negation(&r.to));
        if !negated.is_empty() && !positive.is_empty() {
            let confidences: Vec<f64> = group.iter().map(|r| r.confidence).collect();
            let ids: Vec<String> = group.iter().map(|r| r.id.clone()).collect();
            conflicts.push(ConflictObject::new(tenant_id, entity_id, ConflictType::SemanticContradiction, ids, &confidences));
        }
    }

    conflicts
}

/// `checkConsistency(tenant)`: scan all entities and aggregate
/// (spec §4.J).
pub fn check_consistency(store: &StoreFacade, tenant_id: &str) -> Result<Vec<ConflictObject>> {
    let entities: Vec<crate::domain::Entity> = store.scan_as(&format!("graph:entity:{tenant_id}:*"), None)?;
    let mut conflicts = Vec::new();
    for entity in entities {
        let relations = crate::graph::get_relations(store, tenant_id, &entity.id)?;
        conflicts.extend(check_entity(tenant_id, &entity.id, &relations));
    }
    Ok(conflicts)
}

/// `getContradictionSummary`: classify conflicts by severity bucket
/// (spec §4.J: `<0.4`, `<0.7`, `>=0.7`).
#[derive(Debug, Clone, Default)]
pub struct ContradictionSummary {
    pub low: Vec<ConflictObject>,
    pub medium: Vec<ConflictObject>,
    pub high: Vec<ConflictObject>,
}

pub fn summarize(conflicts: Vec<ConflictObject>) -> ContradictionSummary {
    let mut summary = ContradictionSummary::default();
    for conflict in conflicts {
        match conflict.severity_bucket() {
            "low" => summary.low.push(conflict),
            "medium" => summary.medium.push(conflict),
            _ => summary.high.push(conflict),
        }
    }
    summary
}
