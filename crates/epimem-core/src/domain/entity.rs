//! Graph entity (node) — spec §3 "Entity (graph node)".

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::epistemic::EpistemicStatus;
use crate::text::slug;

/// A single contribution to an entity's aggregate confidence (spec §3
/// "sources[] (each {claim_id, confidence, added_at})").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySource {
    pub claim_id: String,
    pub confidence: f64,
    pub added_at: DateTime<Utc>,
}

/// One entry in an entity's status-history log (spec §3 `metadata.status_history[]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: EpistemicStatus,
    pub at: DateTime<Utc>,
}

/// A graph node (spec §3 "Entity").
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Deterministic id: `{type}_{slug(name)}`.
    pub id: String,
    pub tenant_id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    pub epistemic_status: EpistemicStatus,
    #[serde(default)]
    pub sources: Vec<EntitySource>,
    pub aggregate_confidence: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,
}

impl Entity {
    /// Deterministic id for `(entity_type, name)` (spec §3).
    pub fn make_id(entity_type: &str, name: &str) -> String {
        format!("{}_{}", entity_type, slug(name))
    }

    pub fn new(tenant_id: impl Into<String>, entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Self::make_id(&entity_type, &name),
            tenant_id: tenant_id.into(),
            entity_type,
            name,
            attributes: HashMap::new(),
            epistemic_status: EpistemicStatus::Hypothesis,
            sources: Vec::new(),
            aggregate_confidence: 0.0,
            created_at: now,
            updated_at: now,
            status_history: vec![StatusHistoryEntry { status: EpistemicStatus::Hypothesis, at: now }],
        }
    }
}
