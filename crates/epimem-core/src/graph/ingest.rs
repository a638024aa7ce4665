//! Graph ingestor (spec §4.H).

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::audit::{AuditContext, AuditSink};
use crate::domain::{Confidence, Entity, Relation};
use crate::error::Result;
use crate::keys;
use crate::provider::AiProvider;
use crate::store::StoreFacade;

use super::store::{add_entity, add_relation, SourceContribution};

/// One normalized claim in a session's claim list (spec §3, §8 scenario 2:
/// `{id, claim, topic, confidence}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaim {
    pub id: String,
    pub claim: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub confidence: Confidence,
}

/// Result of one ingestion call (spec §4.H).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestResult {
    pub entities_created: usize,
    pub relations_created: usize,
    pub claims_processed: usize,
    /// True when this call short-circuited on the per-process memo
    /// (spec §4.H "if already ingested this process, return the sentinel
    /// result").
    pub already_ingested: bool,
}

/// `ingestFromSession(tenant, session)` (spec §4.H).
///
/// Idempotent per `(tenant, session)` both because relation/entity ids are
/// deterministic (safe across processes) and, within one process, because
/// of the `memo` cache (spec §5 "a bounded per-process cache, safe to
/// drop").
pub struct GraphIngestor {
    store: StoreFacade,
    provider: Arc<dyn AiProvider>,
    audit: Arc<dyn AuditSink>,
    memo: Mutex<HashSet<(String, String)>>,
}

impl GraphIngestor {
    pub fn new(store: StoreFacade, provider: Arc<dyn AiProvider>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, provider, audit, memo: Mutex::new(HashSet::new()) }
    }

    pub fn ingest_from_session(&self, tenant_id: &str, session_id: &str) -> Result<IngestResult> {
        let memo_key = (tenant_id.to_string(), session_id.to_string());
        {
            let memo = self.memo.lock().expect("ingestor memo lock poisoned");
            if memo.contains(&memo_key) {
                return Ok(IngestResult { already_ingested: true, ..Default::default() });
            }
        }

        let claims: Vec<SessionClaim> = self.store.get_as(&keys::session_claims(tenant_id, session_id))?.unwrap_or_default();
        let texts: Vec<String> = claims.iter().map(|c| c.claim.clone()).collect();
        let entities_batch = self.provider.extract_entities_batch(&texts)?;
        let relations_batch = self.provider.extract_relationships_batch(&texts)?;

        let mut entities_created = 0usize;
        let mut relations_created = 0usize;

        for (i, claim) in claims.iter().enumerate() {
            if let Some(topic) = &claim.topic {
                let topic_id = Entity::make_id("topic", topic);
                let existed = self.store.exists(&keys::graph_entity(tenant_id, &topic_id))?;
                add_entity(
                    &self.store,
                    tenant_id,
                    &topic_id,
                    "topic",
                    topic,
                    HashMap::new(),
                    Some(SourceContribution { claim_id: claim.id.clone(), confidence: claim.confidence.mean }),
                )?;
                if !existed {
                    entities_created += 1;
                }
            }

            if let Some(extracted) = entities_batch.get(i) {
                for entity in extracted {
                    let id = Entity::make_id(&entity.entity_type, &entity.name);
                    let existed = self.store.exists(&keys::graph_entity(tenant_id, &id))?;
                    add_entity(
                        &self.store,
                        tenant_id,
                        &id,
                        &entity.entity_type,
                        &entity.name,
                        entity.attributes.clone(),
                        Some(SourceContribution { claim_id: claim.id.clone(), confidence: claim.confidence.mean }),
                    )?;
                    if !existed {
                        entities_created += 1;
                    }
                }
            }

            if let Some(extracted) = relations_batch.get(i) {
                for relation in extracted {
                    let from_id = Entity::make_id(&relation.from_type, &relation.from);
                    let to_id = Entity::make_id(&relation.to_type, &relation.to);
                    let rel_id = Relation::make_id(&from_id, &relation.relation_type, &to_id);
                    let existed = self.store.exists(&keys::graph_relation(tenant_id, &rel_id))?;
                    add_relation(
                        &self.store,
                        tenant_id,
                        &from_id,
                        &relation.relation_type,
                        &to_id,
                        relation.confidence,
                        Some(SourceContribution { claim_id: claim.id.clone(), confidence: relation.confidence }),
                    )?;
                    if !existed {
                        relations_created += 1;
                    }
                }
            }
        }

        // Only memoize once ingestion has actually completed: marking the
        // session as done before the fallible provider/store calls above
        // would let a transient failure permanently (for this process) wedge
        // the session as a silent no-op on every retry (spec §5 "this memo
        // is a cache — correctness does not depend on it, only idempotence
        // speed").
        self.memo.lock().expect("ingestor memo lock poisoned").insert(memo_key);

        let result = IngestResult { entities_created, relations_created, claims_processed: claims.len(), already_ingested: false };

        let mut data = HashMap::new();
        data.insert("sessionId".to_string(), serde_json::json!(session_id));
        data.insert("entitiesCreated".to_string(), serde_json::json!(result.entities_created));
        data.insert("relationsCreated".to_string(), serde_json::json!(result.relations_created));
        self.audit.log(tenant_id, "graph_ingestion", &data, &AuditContext::default())?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopAuditSink;
    use crate::provider::HeuristicProvider;
    use crate::store::{InMemoryStore, WriteMeta};

    fn seed_session(store: &StoreFacade, tenant: &str, session: &str, claims: Vec<SessionClaim>) {
        store.put_typed(&keys::session_claims(tenant, session), &claims, WriteMeta::new(tenant, "session")).unwrap();
    }

    #[test]
    fn ingest_is_idempotent_within_a_process() {
        let store = StoreFacade::new(Arc::new(InMemoryStore::new()));
        seed_session(
            &store,
            "acme",
            "s1",
            vec![SessionClaim { id: "c1".into(), claim: "blogging is risky".into(), topic: Some("Blogging in 2026".into()), confidence: Confidence::new(0.7, 0.85, 0.78).unwrap() }],
        );
        let ingestor = GraphIngestor::new(store.clone(), Arc::new(HeuristicProvider), Arc::new(NoopAuditSink));

        let first = ingestor.ingest_from_session("acme", "s1").unwrap();
        assert!(!first.already_ingested);
        assert_eq!(first.entities_created, 1);

        let second = ingestor.ingest_from_session("acme", "s1").unwrap();
        assert!(second.already_ingested);
        assert_eq!(second.entities_created, 0);

        let topic_id = Entity::make_id("topic", "Blogging in 2026");
        assert!(store.exists(&keys::graph_entity("acme", &topic_id)).unwrap());
    }
}
