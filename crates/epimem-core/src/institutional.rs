//! Institutional memory promoter (spec §4.M).

use std::sync::Arc;

use crate::config::PromotionCriteria;
use crate::domain::{Claim, EpistemicStatus};
use crate::epistemic_tracker::EpistemicTracker;
use crate::error::Result;
use crate::keys;
use crate::store::{StoreFacade, WriteMeta};

pub struct InstitutionalPromoter {
    store: StoreFacade,
    tracker: EpistemicTracker,
}

/// A claim that failed the promotion gate, with every reason it failed
/// (spec §8 scenario 4: `reasons: ["Low confidence: 0.5 < 0.7"]`).
#[derive(Debug, Clone)]
pub struct Rejection {
    pub claim_id: String,
    pub reasons: Vec<String>,
}

/// `promoteToInstitutional` result (spec §4.M).
#[derive(Debug, Clone, Default)]
pub struct PromotionResult {
    pub promoted: Vec<String>,
    pub rejected: Vec<Rejection>,
    pub promotion_rate: f64,
}

impl InstitutionalPromoter {
    pub fn new(store: StoreFacade, tracker: EpistemicTracker) -> Self {
        Self { store, tracker }
    }

    fn reasons(claim: &Claim, criteria: &PromotionCriteria) -> Vec<String> {
        let mut reasons = Vec::new();
        if claim.confidence.mean < criteria.min_confidence {
            reasons.push(format!("Low confidence: {:.1} < {:.1}", claim.confidence.mean, criteria.min_confidence));
        }
        if criteria.require_evidence && claim.evidence.is_empty() {
            reasons.push("No supporting evidence".to_string());
        }
        if claim.is_contested() {
            reasons.push("Claim is contested".to_string());
        }
        reasons
    }

    /// `promoteToInstitutional(session, criteria)` (spec §4.M):
    /// `min_agreement` gates graph-level consensus (spec §4.I
    /// `Consensus::agreement_rate`), not individual claims, so it plays no
    /// role in this per-claim eligibility check.
    pub fn promote_session(&self, tenant_id: &str, claims: &[Claim], criteria: &PromotionCriteria) -> Result<PromotionResult> {
        let mut promoted = Vec::new();
        let mut rejected = Vec::new();

        for claim in claims {
            let reasons = Self::reasons(claim, criteria);
            if reasons.is_empty() {
                let mut institutional = claim.clone();
                institutional.promoted_at = Some(chrono::Utc::now());
                institutional.metadata.insert("institutional".to_string(), serde_json::json!(true));
                self.store.put_typed(&keys::institutional(tenant_id, &claim.id), &institutional, WriteMeta::new(tenant_id, "institutional"))?;
                let day = institutional.promoted_at.unwrap_or_else(chrono::Utc::now).format("%Y%m%d").to_string();
                self.store.add_to_set(&keys::index_institutional_day(tenant_id, &day), &claim.id)?;
                self.tracker.set_status(tenant_id, &claim.id, EpistemicStatus::Confirmed, std::collections::HashMap::new(), None)?;
                promoted.push(claim.id.clone());
            } else {
                rejected.push(Rejection { claim_id: claim.id.clone(), reasons });
            }
        }

        let total = claims.len();
        let promotion_rate = if total == 0 { 0.0 } else { promoted.len() as f64 / total as f64 };

        Ok(PromotionResult { promoted, rejected, promotion_rate })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopAuditSink;
    use crate::domain::{ClaimContent, Confidence, Evidence, Layer, RetentionStatus, SurpriseComponents};
    use crate::store::InMemoryStore;

    fn claim(id: &str, mean: f64, has_evidence: bool) -> Claim {
        let now = chrono::Utc::now();
        Claim {
            id: id.to_string(),
            tenant_id: "acme".into(),
            agent_id: "agent-1".into(),
            content: ClaimContent::text("a claim"),
            timestamp: now,
            surprise_signal: None,
            surprise_score: 0.5,
            surprise_components: SurpriseComponents::default(),
            importance: 0.5,
            layer: Layer::Warm,
            metadata: Default::default(),
            access_count: 0,
            last_access: now,
            retention_status: RetentionStatus::Active,
            evidence: if has_evidence { vec![Evidence { content: "e".into(), quality: 0.8, source: None }] } else { vec![] },
            contradiction_count: 0,
            confidence: Confidence::new(mean - 0.1, mean + 0.1, mean).unwrap(),
            compression_level: None,
            compression_strategy: None,
            compression_ratio: None,
            original_ref: None,
            promoted_at: None,
            promotion_reason: None,
        }
    }

    #[test]
    fn promotion_matches_spec_scenario() {
        let store = StoreFacade::new(Arc::new(InMemoryStore::new()));
        let tracker = EpistemicTracker::new(store.clone(), Arc::new(NoopAuditSink));
        let promoter = InstitutionalPromoter::new(store, tracker);

        let claims = vec![claim("c1", 0.8, true), claim("c2", 0.5, true)];
        let result = promoter.promote_session("acme", &claims, &PromotionCriteria::default()).unwrap();

        assert_eq!(result.promoted, vec!["c1".to_string()]);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].claim_id, "c2");
        assert_eq!(result.rejected[0].reasons, vec!["Low confidence: 0.5 < 0.7".to_string()]);
        assert!((result.promotion_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn missing_evidence_is_rejected_when_required() {
        let store = StoreFacade::new(Arc::new(InMemoryStore::new()));
        let tracker = EpistemicTracker::new(store.clone(), Arc::new(NoopAuditSink));
        let promoter = InstitutionalPromoter::new(store, tracker);

        let claims = vec![claim("c1", 0.9, false)];
        let result = promoter.promote_session("acme", &claims, &PromotionCriteria::default()).unwrap();
        assert!(result.promoted.is_empty());
        assert_eq!(result.rejected[0].reasons, vec!["No supporting evidence".to_string()]);
    }
}
