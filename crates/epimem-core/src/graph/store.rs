//! Graph store (spec §4.G).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{Entity, EntitySource, Relation};
use crate::error::Result;
use crate::keys;
use crate::store::{StoreFacade, WriteMeta};
use crate::text::clip;

/// `{claim_id, confidence}` — appended to an entity's or relation's
/// `sources[]` and folded into the recency-weighted confidence (spec §4.G).
#[derive(Debug, Clone)]
pub struct SourceContribution {
    pub claim_id: String,
    pub confidence: f64,
}

/// `aggregate = Σ(wᵢ²·cᵢ)/Σ(wᵢ·cᵢ)` with `wᵢ = exp(−age_s/(30·86400))·cᵢ`
/// (spec §4.G; kept verbatim per spec §9 "reproduced verbatim... for
/// behavioral parity" even though it is not a normalized weighted mean).
pub fn recompute_aggregate_confidence(sources: &[EntitySource], now: DateTime<Utc>) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for source in sources {
        let age_s = (now - source.added_at).num_seconds().max(0) as f64;
        let w = (-age_s / (30.0 * 86_400.0)).exp() * source.confidence;
        numerator += w * w * source.confidence;
        denominator += w * source.confidence;
    }
    if denominator == 0.0 {
        0.0
    } else {
        clip(numerator / denominator, 0.0, 1.0)
    }
}

/// `addEntity(tenant, id, type, attrs)` (spec §4.G): merges into an
/// existing entity if present; a `source` contribution is appended to
/// `sources[]` and triggers recency-weighted confidence recomputation.
pub fn add_entity(
    store: &StoreFacade,
    tenant_id: &str,
    id: &str,
    entity_type: &str,
    name: &str,
    attrs: HashMap<String, Value>,
    source: Option<SourceContribution>,
) -> Result<Entity> {
    let now = Utc::now();
    let key = keys::graph_entity(tenant_id, id);
    let mut entity = store.get_as::<Entity>(&key)?.unwrap_or_else(|| Entity::new(tenant_id, entity_type, name));

    entity.attributes.extend(attrs);
    entity.updated_at = now;

    if let Some(contribution) = source {
        entity.sources.push(EntitySource { claim_id: contribution.claim_id, confidence: contribution.confidence, added_at: now });
        entity.aggregate_confidence = recompute_aggregate_confidence(&entity.sources, now);
    }

    store.put_typed(&key, &entity, WriteMeta::new(tenant_id, "graph_entity"))?;
    store.add_to_set(&keys::graph_index_type(tenant_id, entity_type), id)?;

    Ok(entity)
}

/// `addRelation` (spec §4.G): deterministic id, appended sources, updates
/// both endpoints' relation indices.
pub fn add_relation(
    store: &StoreFacade,
    tenant_id: &str,
    from: &str,
    relation: &str,
    to: &str,
    confidence: f64,
    source: Option<SourceContribution>,
) -> Result<Relation> {
    let now = Utc::now();
    let id = Relation::make_id(from, relation, to);
    let key = keys::graph_relation(tenant_id, &id);

    let mut rel = store.get_as::<Relation>(&key)?.unwrap_or_else(|| Relation::new(tenant_id, from, relation, to, confidence));

    if let Some(contribution) = source {
        rel.sources.push(EntitySource { claim_id: contribution.claim_id, confidence: contribution.confidence, added_at: now });
        rel.confidence = recompute_aggregate_confidence(&rel.sources, now);
    }

    store.put_typed(&key, &rel, WriteMeta::new(tenant_id, "graph_relation"))?;
    store.add_to_set(&keys::graph_index_relations(tenant_id, from), &id)?;
    store.add_to_set(&keys::graph_index_relations(tenant_id, to), &id)?;

    Ok(rel)
}

/// `getRelations(entity_id)`: the union from that entity's relation index
/// (spec §4.G).
pub fn get_relations(store: &StoreFacade, tenant_id: &str, entity_id: &str) -> Result<Vec<Relation>> {
    store.resolve_set(&keys::graph_index_relations(tenant_id, entity_id), |rid| keys::graph_relation(tenant_id, rid))
}
