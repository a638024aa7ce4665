//! Self-audit (spec §4.O) — wisdom metrics, weak-support detection, and
//! institutional growth trending.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::consistency::{self, ContradictionSummary};
use crate::domain::{Claim, ConflictObject, EpistemicStatus};
use crate::epistemic_tracker::EpistemicTracker;
use crate::error::Result;
use crate::keys;
use crate::minority_tracker::MinorityTracker;
use crate::store::{StoreFacade, WriteMeta};
use crate::text::clip;

pub struct SelfAuditor {
    store: StoreFacade,
    tracker: EpistemicTracker,
    minority: MinorityTracker,
}

/// `findWeaklySupported` entry (spec §4.O).
#[derive(Debug, Clone)]
pub struct WeaklySupported {
    pub claim_id: String,
    pub confidence: f64,
    pub evidence_count: usize,
    pub risk_score: f64,
}

/// `getWisdomMetrics` result (spec §4.O).
#[derive(Debug, Clone, Default)]
pub struct WisdomMetrics {
    pub status_counts: std::collections::HashMap<String, usize>,
    pub institutional_count: usize,
    pub evidence_ratio: f64,
    pub minority_accuracy: f64,
    pub confirmation_rate: f64,
    pub wisdom_score: f64,
}

/// `trending` classification (spec §4.O).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    Volatile,
}

impl SelfAuditor {
    pub fn new(store: StoreFacade, tracker: EpistemicTracker, minority: MinorityTracker) -> Self {
        Self { store, tracker, minority }
    }

    fn institutional_claims(&self, tenant_id: &str) -> Result<Vec<Claim>> {
        self.store.scan_as(&format!("institutional:{tenant_id}:*"), None)
    }

    /// `findWeaklySupported({min_confidence, max_evidence})` (spec §4.O):
    /// high-confidence institutional claims resting on thin evidence.
    pub fn find_weakly_supported(&self, tenant_id: &str, min_confidence: f64, max_evidence: usize) -> Result<Vec<WeaklySupported>> {
        let mut out: Vec<WeaklySupported> = self
            .institutional_claims(tenant_id)?
            .into_iter()
            .filter(|c| c.confidence.mean >= min_confidence && c.evidence.len() <= max_evidence)
            .map(|c| {
                let evidence_count = c.evidence.len();
                let risk_score = c.confidence.mean / (evidence_count.max(1) as f64);
                WeaklySupported { claim_id: c.id, confidence: c.confidence.mean, evidence_count, risk_score }
            })
            .collect();
        out.sort_by(|a, b| b.risk_score.partial_cmp(&a.risk_score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(out)
    }

    /// `findHighConfidenceConflicts` (spec §4.O): the "high" bucket of J's
    /// contradiction summary.
    pub fn find_high_confidence_conflicts(&self, tenant_id: &str) -> Result<Vec<ConflictObject>> {
        let conflicts = consistency::check_consistency(&self.store, tenant_id)?;
        let ContradictionSummary { high, .. } = consistency::summarize(conflicts);
        Ok(high)
    }

    /// `getWisdomMetrics` (spec §4.O).
    pub fn get_wisdom_metrics(&self, tenant_id: &str) -> Result<WisdomMetrics> {
        let mut metrics = WisdomMetrics::default();

        let statuses = [
            EpistemicStatus::Hypothesis,
            EpistemicStatus::Evidence,
            EpistemicStatus::Assumption,
            EpistemicStatus::Decision,
            EpistemicStatus::Rejected,
            EpistemicStatus::Confirmed,
            EpistemicStatus::Contested,
        ];
        let mut total_status = 0usize;
        let mut confirmed = 0usize;
        for status in statuses {
            let count = self.tracker.get_claims_by_status(tenant_id, status)?.len();
            metrics.status_counts.insert(status.as_str().to_string(), count);
            total_status += count;
            if status == EpistemicStatus::Confirmed {
                confirmed = count;
            }
        }
        metrics.confirmation_rate = if total_status == 0 { 0.0 } else { confirmed as f64 / total_status as f64 };

        let institutional = self.institutional_claims(tenant_id)?;
        metrics.institutional_count = institutional.len();
        let with_evidence = institutional.iter().filter(|c| !c.evidence.is_empty()).count();
        metrics.evidence_ratio = if institutional.is_empty() { 0.0 } else { with_evidence as f64 / institutional.len() as f64 };

        let dissenters = self.minority.get_reliable_dissenters(tenant_id, 0.0, 0)?;
        metrics.minority_accuracy = if dissenters.is_empty() {
            0.0
        } else {
            dissenters.iter().map(|d| d.accuracy).sum::<f64>() / dissenters.len() as f64
        };

        let institutional_term = (metrics.institutional_count as f64 + 1.0).ln() / 10.0;
        metrics.wisdom_score = clip(
            0.3 * metrics.evidence_ratio + 0.3 * metrics.minority_accuracy + 0.2 * metrics.confirmation_rate + 0.2 * institutional_term.min(1.0),
            0.0,
            1.0,
        );

        self.record_wisdom_snapshot(tenant_id, &metrics)?;
        Ok(metrics)
    }

    /// Persists a point-in-time wisdom-score snapshot (spec §6.1
    /// `wisdom_trend:{t}`, `wisdom_trend_history:{t}:{ts}`) so repeated
    /// [`SelfAuditor::get_wisdom_metrics`] calls leave a trail a caller can
    /// chart, independent of the day-bucketed `trending` classification.
    fn record_wisdom_snapshot(&self, tenant_id: &str, metrics: &WisdomMetrics) -> Result<()> {
        let now = Utc::now();
        self.store.put_typed(&keys::wisdom_trend(tenant_id), &(now, metrics.wisdom_score), WriteMeta::new(tenant_id, "wisdom_trend"))?;
        self.store.put_typed(
            &keys::wisdom_trend_history(tenant_id, now.timestamp()),
            &(now, metrics.wisdom_score),
            WriteMeta::new(tenant_id, "wisdom_trend_history"),
        )?;
        Ok(())
    }

    fn day_key(at: DateTime<Utc>) -> String {
        at.format("%Y%m%d").to_string()
    }

    /// Idempotently backfills `index:institutional:{tenant}:{yyyymmdd}`
    /// from existing institutional records (spec §4.O: "lazily built").
    fn ensure_daily_indices_built(&self, tenant_id: &str) -> Result<()> {
        let marker_key = keys::institutional_indices_built(tenant_id);
        if self.store.exists(&marker_key)? {
            return Ok(());
        }
        for claim in self.institutional_claims(tenant_id)? {
            let at = claim.promoted_at.unwrap_or(claim.timestamp);
            self.store.add_to_set(&keys::index_institutional_day(tenant_id, &Self::day_key(at)), &claim.id)?;
        }
        self.store.put_typed(&marker_key, &true, WriteMeta::new(tenant_id, "institutional_indices_built"))?;
        Ok(())
    }

    /// `trending` (spec §4.O): last 7 days vs the prior 7, `>+10%`
    /// increasing, `<-10%` decreasing, else stable; `volatile` overrides
    /// both when counts are small (`<=3`) and the swing is large (`>=50%`).
    pub fn trending(&self, tenant_id: &str) -> Result<Trend> {
        self.ensure_daily_indices_built(tenant_id)?;
        let now = Utc::now();

        let mut recent = 0usize;
        let mut prior = 0usize;
        for offset in 0i64..14 {
            let day = now - Duration::days(offset);
            let count = self.store.set_count(&keys::index_institutional_day(tenant_id, &Self::day_key(day)))?;
            if offset < 7 {
                recent += count;
            } else {
                prior += count;
            }
        }

        if recent <= 3 && prior <= 3 {
            let swing = (recent as f64 - prior as f64).abs();
            let base = prior.max(1) as f64;
            if swing / base >= 0.5 {
                return Ok(Trend::Volatile);
            }
        }

        if prior == 0 {
            return Ok(if recent > 0 { Trend::Increasing } else { Trend::Stable });
        }

        let change = (recent as f64 - prior as f64) / prior as f64;
        if change > 0.10 {
            Ok(Trend::Increasing)
        } else if change < -0.10 {
            Ok(Trend::Decreasing)
        } else {
            Ok(Trend::Stable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopAuditSink;
    use crate::domain::{ClaimContent, Confidence, Evidence, Layer, RetentionStatus, SurpriseComponents};
    use crate::store::InMemoryStore;

    fn claim(id: &str, mean: f64, evidence_count: usize) -> Claim {
        let now = Utc::now();
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
            evidence: (0..evidence_count).map(|_| Evidence { content: "e".into(), quality: 0.8, source: None }).collect(),
            contradiction_count: 0,
            confidence: Confidence::new(mean - 0.05, mean + 0.05, mean).unwrap(),
            compression_level: None,
            compression_strategy: None,
            compression_ratio: None,
            original_ref: None,
            promoted_at: Some(now),
            promotion_reason: None,
        }
    }

    fn auditor() -> (StoreFacade, SelfAuditor) {
        let store = StoreFacade::new(Arc::new(InMemoryStore::new()));
        let tracker = EpistemicTracker::new(store.clone(), Arc::new(NoopAuditSink));
        let minority = MinorityTracker::new(store.clone(), Arc::new(NoopAuditSink));
        (store.clone(), SelfAuditor::new(store, tracker, minority))
    }

    #[test]
    fn weakly_supported_ranks_by_risk() {
        let (store, auditor) = auditor();
        store.put_typed(&keys::institutional("acme", "c1"), &claim("c1", 0.9, 0), WriteMeta::new("acme", "institutional")).unwrap();
        store.put_typed(&keys::institutional("acme", "c2"), &claim("c2", 0.75, 2), WriteMeta::new("acme", "institutional")).unwrap();

        let weak = auditor.find_weakly_supported("acme", 0.7, 2).unwrap();
        assert_eq!(weak.len(), 2);
        assert_eq!(weak[0].claim_id, "c1");
    }

    #[test]
    fn wisdom_score_is_bounded() {
        let (store, auditor) = auditor();
        store.put_typed(&keys::institutional("acme", "c1"), &claim("c1", 0.9, 2), WriteMeta::new("acme", "institutional")).unwrap();

        let metrics = auditor.get_wisdom_metrics("acme").unwrap();
        assert!((0.0..=1.0).contains(&metrics.wisdom_score));
        assert_eq!(metrics.institutional_count, 1);
    }

    #[test]
    fn trending_is_stable_with_no_history() {
        let (_, auditor) = auditor();
        assert_eq!(auditor.trending("acme").unwrap(), Trend::Stable);
    }
}
