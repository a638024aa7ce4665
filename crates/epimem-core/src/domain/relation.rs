//! Graph relation (edge) — spec §3 "Relation (graph edge)".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::entity::EntitySource;

/// A graph edge (spec §3 "Relation").
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// `rel_` + hash(`from ∥ relation ∥ to`) — ingesting the same triple
    /// never creates a duplicate.
    pub id: String,
    pub tenant_id: String,
    pub from: String,
    pub relation: String,
    pub to: String,
    pub confidence: f64,
    #[serde(default)]
    pub sources: Vec<EntitySource>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub has_contradiction: bool,
    #[serde(default)]
    pub contradicting_relations: Vec<String>,
}

impl Relation {
    /// Deterministic id for a `(from, relation, to)` triple.
    ///
    /// `vestige-core` doesn't need a stable content hash anywhere (its ids
    /// are random UUIDs); this core does, because idempotent ingestion
    /// (spec §4.H, §8) requires the *same* id across repeated runs. `sha2`
    /// is the hashing crate the example pack reaches for (e.g.
    /// `ruvector-edge-net`'s `sha2` dependency) when a stable digest is
    /// needed instead of `std`'s randomly-seeded `DefaultHasher`.
    pub fn make_id(from: &str, relation: &str, to: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(from.as_bytes());
        hasher.update(b"\0");
        hasher.update(relation.as_bytes());
        hasher.update(b"\0");
        hasher.update(to.as_bytes());
        let digest = hasher.finalize();
        let hex = format!("{:x}", digest);
        format!("rel_{}", &hex[..20])
    }

    pub fn new(tenant_id: impl Into<String>, from: impl Into<String>, relation: impl Into<String>, to: impl Into<String>, confidence: f64) -> Self {
        let from = from.into();
        let relation = relation.into();
        let to = to.into();
        let id = Self::make_id(&from, &relation, &to);
        Self {
            id,
            tenant_id: tenant_id.into(),
            from,
            relation,
            to,
            confidence,
            sources: Vec::new(),
            created_at: Utc::now(),
            has_contradiction: false,
            contradicting_relations: Vec::new(),
        }
    }
}
