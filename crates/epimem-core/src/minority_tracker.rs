//! Minority-opinion tracker (spec §4.L).

use std::sync::Arc;

use crate::audit::{AuditContext, AuditSink};
use crate::domain::{MinorityAccuracy, MinorityOpinion};
use crate::error::Result;
use crate::keys;
use crate::store::{StoreFacade, WriteMeta};
use crate::text::normalize;

pub struct MinorityTracker {
    store: StoreFacade,
    audit: Arc<dyn AuditSink>,
}

/// Input to [`MinorityTracker::record`] (spec §3 "Minority opinion").
#[derive(Debug, Clone)]
pub struct RecordOpinion {
    pub agent_id: String,
    pub position: String,
    pub reasoning: String,
    pub confidence: f64,
    pub majority_position: String,
    pub topic: Option<String>,
}

impl MinorityTracker {
    pub fn new(store: StoreFacade, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// `record(tenant, session, opinion)` (spec §4.L): `proven_correct`
    /// starts `null` until an outcome is verified.
    pub fn record(&self, tenant_id: &str, session_id: &str, opinion: RecordOpinion) -> Result<MinorityOpinion> {
        let record = MinorityOpinion {
            id: MinorityOpinion::new_id(),
            tenant_id: tenant_id.to_string(),
            session_id: session_id.to_string(),
            agent_id: opinion.agent_id.clone(),
            position: opinion.position,
            reasoning: opinion.reasoning,
            confidence: opinion.confidence,
            majority_position: opinion.majority_position,
            topic: opinion.topic.clone(),
            recorded_at: chrono::Utc::now(),
            outcome: None,
            proven_correct: None,
            verified_at: None,
        };

        self.store.put_typed(&keys::minority_opinion(tenant_id, &record.id), &record, WriteMeta::new(tenant_id, "minority_opinion"))?;
        self.store.add_to_set(&keys::minority_index(tenant_id, "agent", &opinion.agent_id), &record.id)?;
        if let Some(topic) = &opinion.topic {
            self.store.add_to_set(&keys::minority_index(tenant_id, "topic", topic), &record.id)?;
        }

        Ok(record)
    }

    /// `trackAccuracy(agent, outcomes)` (spec §4.L): for each `(opinion_id,
    /// actual)` pair, set `proven_correct = normalize(position) ==
    /// normalize(actual)` and fold the result into the agent's running
    /// accuracy.
    pub fn track_accuracy(&self, tenant_id: &str, agent_id: &str, outcomes: &[(String, String)]) -> Result<MinorityAccuracy> {
        let accuracy_key = keys::minority_accuracy(tenant_id, agent_id);
        let mut accuracy: MinorityAccuracy = self.store.get_as(&accuracy_key)?.unwrap_or_else(|| MinorityAccuracy {
            agent_id: agent_id.to_string(),
            ..Default::default()
        });

        for (opinion_id, actual) in outcomes {
            let key = keys::minority_opinion(tenant_id, opinion_id);
            let Some(mut opinion) = self.store.get_as::<MinorityOpinion>(&key)? else {
                continue;
            };
            let correct = normalize(&opinion.position) == normalize(actual);
            opinion.outcome = Some(actual.clone());
            opinion.proven_correct = Some(correct);
            opinion.verified_at = Some(chrono::Utc::now());
            self.store.put_typed(&key, &opinion, WriteMeta::new(tenant_id, "minority_opinion"))?;

            accuracy.total_opinions += 1;
            if correct {
                accuracy.correct_count += 1;
            }
        }
        accuracy.recompute_accuracy();
        self.store.put_typed(&accuracy_key, &accuracy, WriteMeta::new(tenant_id, "minority_accuracy"))?;

        let mut data = std::collections::HashMap::new();
        data.insert("agentId".to_string(), serde_json::json!(agent_id));
        data.insert("accuracy".to_string(), serde_json::json!(accuracy.accuracy));
        self.audit.log(tenant_id, "minority_accuracy_update", &data, &AuditContext::default())?;

        Ok(accuracy)
    }

    /// `getReliableDissenters({min_accuracy, min_opinions})` (spec §4.L),
    /// sorted by `reliability()` descending.
    pub fn get_reliable_dissenters(&self, tenant_id: &str, min_accuracy: f64, min_opinions: u64) -> Result<Vec<MinorityAccuracy>> {
        let pattern = format!("minority_accuracy:{tenant_id}:*");
        let mut accounts: Vec<MinorityAccuracy> = self
            .store
            .scan_as(&pattern, None)?
            .into_iter()
            .filter(|a: &MinorityAccuracy| a.accuracy >= min_accuracy && a.total_opinions >= min_opinions)
            .collect();
        accounts.sort_by(|a, b| b.reliability().partial_cmp(&a.reliability()).unwrap_or(std::cmp::Ordering::Equal));
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopAuditSink;
    use crate::store::InMemoryStore;

    fn tracker() -> MinorityTracker {
        MinorityTracker::new(StoreFacade::new(Arc::new(InMemoryStore::new())), Arc::new(NoopAuditSink))
    }

    #[test]
    fn record_then_accuracy_matches_spec_scenario() {
        let tracker = tracker();
        let mut outcomes = Vec::new();
        for i in 0..5 {
            let opinion = tracker
                .record(
                    "acme",
                    "s1",
                    RecordOpinion {
                        agent_id: "bob".into(),
                        position: format!("pos-{i}"),
                        reasoning: "because".into(),
                        confidence: 0.6,
                        majority_position: "other".into(),
                        topic: Some("X".into()),
                    },
                )
                .unwrap();
            let actual = if i < 4 { format!("pos-{i}") } else { "something-else".to_string() };
            outcomes.push((opinion.id, actual));
        }

        let accuracy = tracker.track_accuracy("acme", "bob", &outcomes).unwrap();
        assert!((accuracy.accuracy - 0.8).abs() < 1e-9);
        assert!((accuracy.reliability() - 1.43).abs() < 0.01);
    }

    #[test]
    fn reliable_dissenters_filters_by_threshold() {
        let tracker = tracker();
        tracker
            .record("acme", "s1", RecordOpinion { agent_id: "bob".into(), position: "p".into(), reasoning: "r".into(), confidence: 0.6, majority_position: "m".into(), topic: None })
            .unwrap();
        let opinion = tracker
            .record("acme", "s1", RecordOpinion { agent_id: "bob".into(), position: "p2".into(), reasoning: "r".into(), confidence: 0.6, majority_position: "m".into(), topic: None })
            .unwrap();
        tracker.track_accuracy("acme", "bob", &[(opinion.id, "p2".to_string())]).unwrap();

        let low_bar = tracker.get_reliable_dissenters("acme", 0.5, 1).unwrap();
        assert_eq!(low_bar.len(), 1);
        let high_bar = tracker.get_reliable_dissenters("acme", 0.5, 3).unwrap();
        assert!(high_bar.is_empty());
    }
}
