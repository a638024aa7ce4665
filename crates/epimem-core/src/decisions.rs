//! Decision lineage recorder and reporter (spec §4.N).
//!
//! [`crate::domain::DecisionLineage`] is the data shape; this module is the
//! logic around it — recording, downstream lookup, and reporting.

use crate::domain::{DecisionLineage, RejectedClaim, UsedClaim};
use crate::error::Result;
use crate::keys;
use crate::store::{StoreFacade, WriteMeta};

pub struct DecisionRecorder {
    store: StoreFacade,
}

/// Input to [`DecisionRecorder::record_decision`] (spec §4.N).
#[derive(Debug, Clone)]
pub struct RecordDecision {
    pub decision_id: String,
    pub decision: String,
    pub claims_used: Vec<UsedClaim>,
    pub claims_rejected: Vec<RejectedClaim>,
    pub conflicts_unresolved: Vec<String>,
    pub reasoning: Vec<String>,
}

impl DecisionRecorder {
    pub fn new(store: StoreFacade) -> Self {
        Self { store }
    }

    /// `recordDecision(decision_id, {...})` (spec §4.N): `confidence_score`
    /// is always derived, never caller-supplied.
    pub fn record_decision(&self, tenant_id: &str, input: RecordDecision) -> Result<DecisionLineage> {
        let confidence_score = DecisionLineage::confidence_from_used(&input.claims_used);
        let lineage = DecisionLineage {
            decision_id: input.decision_id,
            tenant_id: tenant_id.to_string(),
            decision: input.decision,
            claims_used: input.claims_used,
            claims_rejected: input.claims_rejected,
            conflicts_unresolved: input.conflicts_unresolved,
            confidence_score,
            reasoning: input.reasoning,
            timestamp: chrono::Utc::now(),
        };
        self.store.put_typed(&keys::decision(tenant_id, &lineage.decision_id), &lineage, WriteMeta::new(tenant_id, "decision"))?;
        Ok(lineage)
    }

    pub fn get_decision(&self, tenant_id: &str, decision_id: &str) -> Result<Option<DecisionLineage>> {
        self.store.get_as(&keys::decision(tenant_id, decision_id))
    }

    /// `getDownstreamDecisions(claim_id)` (spec §4.N): every decision whose
    /// `claims_used` references `claim_id`. No dedicated index is
    /// maintained for this (decisions are expected to be queried by id far
    /// more often than by claim), so this scans the tenant's decisions.
    pub fn get_downstream_decisions(&self, tenant_id: &str, claim_id: &str) -> Result<Vec<DecisionLineage>> {
        let pattern = format!("decision:{tenant_id}:*");
        let decisions: Vec<DecisionLineage> = self.store.scan_as(&pattern, None)?;
        Ok(decisions.into_iter().filter(|d| d.claims_used.iter().any(|u| u.claim_id == claim_id)).collect())
    }

    /// `generateDecisionReport(decision_id)` (spec §4.N): a sectioned view
    /// over the stored lineage, not a separate record.
    pub fn generate_report(&self, tenant_id: &str, decision_id: &str) -> Result<Option<DecisionReport>> {
        let Some(lineage) = self.get_decision(tenant_id, decision_id)? else {
            return Ok(None);
        };
        Ok(Some(DecisionReport {
            summary: lineage.decision.clone(),
            claims_used: lineage.claims_used.clone(),
            claims_rejected: lineage.claims_rejected.clone(),
            conflicts_unresolved: lineage.conflicts_unresolved.clone(),
            reasoning_chain: lineage.reasoning.clone(),
            confidence_score: lineage.confidence_score,
            decided_at: lineage.timestamp,
        }))
    }
}

/// Report view returned by [`DecisionRecorder::generate_report`].
#[derive(Debug, Clone)]
pub struct DecisionReport {
    pub summary: String,
    pub claims_used: Vec<UsedClaim>,
    pub claims_rejected: Vec<RejectedClaim>,
    pub conflicts_unresolved: Vec<String>,
    pub reasoning_chain: Vec<String>,
    pub confidence_score: f64,
    pub decided_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn recorder() -> DecisionRecorder {
        DecisionRecorder::new(StoreFacade::new(Arc::new(InMemoryStore::new())))
    }

    #[test]
    fn recorded_confidence_derives_from_used_claims() {
        let recorder = recorder();
        let lineage = recorder
            .record_decision(
                "acme",
                RecordDecision {
                    decision_id: "d1".into(),
                    decision: "ship it".into(),
                    claims_used: vec![UsedClaim { claim_id: "c1".into(), weight: 0.8 }, UsedClaim { claim_id: "c2".into(), weight: 0.6 }],
                    claims_rejected: vec![RejectedClaim { claim_id: "c3".into(), reason: "stale".into() }],
                    conflicts_unresolved: vec![],
                    reasoning: vec!["because evidence".into()],
                },
            )
            .unwrap();

        assert!((lineage.confidence_score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn downstream_lookup_finds_referencing_decisions() {
        let recorder = recorder();
        recorder
            .record_decision(
                "acme",
                RecordDecision {
                    decision_id: "d1".into(),
                    decision: "ship it".into(),
                    claims_used: vec![UsedClaim { claim_id: "c1".into(), weight: 0.8 }],
                    claims_rejected: vec![],
                    conflicts_unresolved: vec![],
                    reasoning: vec![],
                },
            )
            .unwrap();
        recorder
            .record_decision(
                "acme",
                RecordDecision {
                    decision_id: "d2".into(),
                    decision: "hold off".into(),
                    claims_used: vec![UsedClaim { claim_id: "c9".into(), weight: 0.5 }],
                    claims_rejected: vec![],
                    conflicts_unresolved: vec![],
                    reasoning: vec![],
                },
            )
            .unwrap();

        let downstream = recorder.get_downstream_decisions("acme", "c1").unwrap();
        assert_eq!(downstream.len(), 1);
        assert_eq!(downstream[0].decision_id, "d1");
    }

    #[test]
    fn report_reflects_stored_lineage() {
        let recorder = recorder();
        recorder
            .record_decision(
                "acme",
                RecordDecision {
                    decision_id: "d1".into(),
                    decision: "ship it".into(),
                    claims_used: vec![UsedClaim { claim_id: "c1".into(), weight: 0.9 }],
                    claims_rejected: vec![],
                    conflicts_unresolved: vec!["conflict_x".into()],
                    reasoning: vec!["step one".into(), "step two".into()],
                },
            )
            .unwrap();

        let report = recorder.generate_report("acme", "d1").unwrap().unwrap();
        assert_eq!(report.summary, "ship it");
        assert_eq!(report.reasoning_chain.len(), 2);
        assert_eq!(report.conflicts_unresolved, vec!["conflict_x".to_string()]);
    }
}
