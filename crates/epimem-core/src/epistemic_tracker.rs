//! Epistemic status tracker (spec §4.K).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::audit::{AuditContext, AuditSink};
use crate::domain::{EpistemicStatus, EpistemicStatusRecord, StatusTransition};
use crate::error::Result;
use crate::keys;
use crate::store::{StoreFacade, WriteMeta};

pub struct EpistemicTracker {
    store: StoreFacade,
    audit: Arc<dyn AuditSink>,
}

impl EpistemicTracker {
    pub fn new(store: StoreFacade, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// `setStatus(claim, status, justification)` (spec §4.K): validates
    /// against the closed status set, records the transition, and maintains
    /// the `epistemic_index:{status}` membership.
    pub fn set_status(
        &self,
        tenant_id: &str,
        claim_id: &str,
        status: EpistemicStatus,
        justification: HashMap<String, Value>,
        set_by: Option<String>,
    ) -> Result<EpistemicStatusRecord> {
        let status_key = keys::epistemic_status(tenant_id, claim_id);
        let previous: Option<EpistemicStatusRecord> = self.store.get_as(&status_key)?;
        let previous_status = previous.as_ref().map(|r| r.status);

        let now = chrono::Utc::now();
        let record = EpistemicStatusRecord {
            tenant_id: tenant_id.to_string(),
            claim_id: claim_id.to_string(),
            status,
            previous_status,
            justification,
            set_at: now,
            set_by: set_by.clone(),
        };
        self.store.put_typed(&status_key, &record, WriteMeta::new(tenant_id, "epistemic_status"))?;

        if previous_status != Some(status) {
            let transitions_key = keys::epistemic_transitions(tenant_id, claim_id);
            let mut transitions: Vec<StatusTransition> = self.store.get_as(&transitions_key)?.unwrap_or_default();
            transitions.push(StatusTransition { from: previous_status, to: status, at: now, set_by });
            self.store.put_typed(&transitions_key, &transitions, WriteMeta::new(tenant_id, "epistemic_transitions"))?;

            if let Some(old_status) = previous_status {
                self.store.remove_from_set(&keys::epistemic_index(tenant_id, old_status.as_str()), claim_id)?;
            }
            self.store.add_to_set(&keys::epistemic_index(tenant_id, status.as_str()), claim_id)?;
        }

        let mut data = HashMap::new();
        data.insert("claimId".to_string(), serde_json::json!(claim_id));
        data.insert("status".to_string(), serde_json::json!(status.as_str()));
        self.audit.log(tenant_id, "set_epistemic_status", &data, &AuditContext::default())?;

        Ok(record)
    }

    pub fn get_status(&self, tenant_id: &str, claim_id: &str) -> Result<Option<EpistemicStatusRecord>> {
        self.store.get_as(&keys::epistemic_status(tenant_id, claim_id))
    }

    pub fn get_transitions(&self, tenant_id: &str, claim_id: &str) -> Result<Vec<StatusTransition>> {
        Ok(self.store.get_as(&keys::epistemic_transitions(tenant_id, claim_id))?.unwrap_or_default())
    }

    /// `getClaimsByStatus(status)` (spec §4.K): membership of the status
    /// index set.
    pub fn get_claims_by_status(&self, tenant_id: &str, status: EpistemicStatus) -> Result<Vec<String>> {
        self.store.set_members(&keys::epistemic_index(tenant_id, status.as_str()))
    }

    /// `getReasoningBasis(claim_ids)` (spec §4.K): bucket each claim's
    /// current status and classify the overall reasoning quality.
    pub fn get_reasoning_basis(&self, tenant_id: &str, claim_ids: &[String]) -> Result<ReasoningBasis> {
        let mut basis = ReasoningBasis::default();
        for claim_id in claim_ids {
            let Some(record) = self.get_status(tenant_id, claim_id)? else {
                continue;
            };
            match record.status {
                EpistemicStatus::Evidence | EpistemicStatus::Confirmed => basis.facts.push(claim_id.clone()),
                EpistemicStatus::Assumption => basis.assumptions.push(claim_id.clone()),
                EpistemicStatus::Hypothesis | EpistemicStatus::Contested => basis.hypotheses.push(claim_id.clone()),
                EpistemicStatus::Decision => basis.decisions.push(claim_id.clone()),
                EpistemicStatus::Rejected => basis.rejected.push(claim_id.clone()),
            }
        }

        let total = basis.facts.len() + basis.assumptions.len() + basis.hypotheses.len() + basis.decisions.len() + basis.rejected.len();
        if total > 0 {
            basis.fact_ratio = basis.facts.len() as f64 / total as f64;
            basis.assumption_ratio = basis.assumptions.len() as f64 / total as f64;
        }

        basis.reasoning_quality = if basis.fact_ratio >= 0.7 {
            "strong"
        } else if basis.assumption_ratio >= 0.7 {
            "weak"
        } else if basis.fact_ratio >= 0.4 {
            "moderate"
        } else {
            "speculative"
        };

        Ok(basis)
    }
}

/// Result of [`EpistemicTracker::get_reasoning_basis`] (spec §4.K).
#[derive(Debug, Clone, Default)]
pub struct ReasoningBasis {
    pub facts: Vec<String>,
    pub assumptions: Vec<String>,
    pub hypotheses: Vec<String>,
    pub decisions: Vec<String>,
    pub rejected: Vec<String>,
    pub fact_ratio: f64,
    pub assumption_ratio: f64,
    pub reasoning_quality: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopAuditSink;
    use crate::store::InMemoryStore;

    fn tracker() -> EpistemicTracker {
        EpistemicTracker::new(StoreFacade::new(Arc::new(InMemoryStore::new())), Arc::new(NoopAuditSink))
    }

    #[test]
    fn status_change_is_recorded_and_monotonic() {
        let tracker = tracker();
        tracker.set_status("acme", "amem_1", EpistemicStatus::Hypothesis, HashMap::new(), None).unwrap();
        tracker.set_status("acme", "amem_1", EpistemicStatus::Confirmed, HashMap::new(), None).unwrap();

        let transitions = tracker.get_transitions("acme", "amem_1").unwrap();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].from, None);
        assert_eq!(transitions[0].to, EpistemicStatus::Hypothesis);
        assert_eq!(transitions[1].from, Some(EpistemicStatus::Hypothesis));
        assert_eq!(transitions[1].to, EpistemicStatus::Confirmed);
    }

    #[test]
    fn status_index_moves_membership() {
        let tracker = tracker();
        tracker.set_status("acme", "amem_1", EpistemicStatus::Hypothesis, HashMap::new(), None).unwrap();
        tracker.set_status("acme", "amem_1", EpistemicStatus::Confirmed, HashMap::new(), None).unwrap();

        assert!(tracker.get_claims_by_status("acme", EpistemicStatus::Confirmed).unwrap().contains(&"amem_1".to_string()));
        assert!(!tracker.get_claims_by_status("acme", EpistemicStatus::Hypothesis).unwrap().contains(&"amem_1".to_string()));
    }

    #[test]
    fn reasoning_basis_scenario_example() {
        let tracker = tracker();
        tracker.set_status("acme", "c1", EpistemicStatus::Evidence, HashMap::new(), None).unwrap();
        tracker.set_status("acme", "c2", EpistemicStatus::Confirmed, HashMap::new(), None).unwrap();
        tracker.set_status("acme", "c3", EpistemicStatus::Assumption, HashMap::new(), None).unwrap();

        let basis = tracker.get_reasoning_basis("acme", &["c1".into(), "c2".into(), "c3".into()]).unwrap();
        assert!((basis.fact_ratio - 0.667).abs() < 0.01);
        assert!((basis.assumption_ratio - 0.333).abs() < 0.01);
        assert_eq!(basis.reasoning_quality, "moderate");
    }
}
