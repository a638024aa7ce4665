//! Adaptive memory orchestrator (spec §4.F).
//!
//! The one component that touches every collaborator seam (store, provider,
//! audit, dispatcher) in a single call, the way `vestige-core`'s
//! consolidation entry point ties scheduling, scoring and storage together
//! behind one public function.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::audit::{AuditContext, AuditSink};
use crate::compression::{self, CompressionCriteria};
use crate::config::RetentionPolicy;
use crate::domain::{Claim, ClaimContent, Confidence, Evidence, Layer, RetentionStatus, SurpriseComponents};
use crate::dispatcher::JobDispatcher;
use crate::error::{CoreError, Result};
use crate::keys;
use crate::provider::AiProvider;
use crate::retention::{self, RetentionDecision};
use crate::store::{ScanFilter, StoreFacade, WriteMeta};
use crate::surprise::{self, ContextClaim, SurpriseWeights};
use crate::text::clip;

/// Compression level a retention sweep applies when a claim falls below
/// `compression_threshold` (spec §4.D levels 1..4; the sweep itself doesn't
/// pick a level, so this core applies the mid-range default — see
/// `DESIGN.md`).
const SWEEP_COMPRESSION_LEVEL: u8 = 2;

/// `importance *= 1.2` on promotion, `*= 0.8` on demotion (spec §4.F).
const PROMOTION_IMPORTANCE_MULTIPLIER: f64 = 1.2;
const DEMOTION_IMPORTANCE_MULTIPLIER: f64 = 0.8;

/// How many of an agent's most recent claims feed surprise scoring
/// (spec §4.B).
const CONTEXT_WINDOW: usize = 50;

/// Optional range/equality filters for [`AdaptiveMemoryOrchestrator::query_by_surprise`]
/// (spec §4.F).
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    pub layer: Option<Layer>,
    pub agent_id: Option<String>,
    pub importance_range: Option<(f64, f64)>,
}

/// Ties the store, AI provider, audit sink and job dispatcher together for
/// the claim lifecycle (spec §4.F).
pub struct AdaptiveMemoryOrchestrator {
    pub store: StoreFacade,
    pub provider: Arc<dyn AiProvider>,
    pub audit: Arc<dyn AuditSink>,
    pub dispatcher: Arc<dyn JobDispatcher>,
}

impl AdaptiveMemoryOrchestrator {
    pub fn new(store: StoreFacade, provider: Arc<dyn AiProvider>, audit: Arc<dyn AuditSink>, dispatcher: Arc<dyn JobDispatcher>) -> Self {
        Self { store, provider, audit, dispatcher }
    }

    fn recent_claims_for_agent(&self, tenant_id: &str, agent_id: &str) -> Result<Vec<Claim>> {
        let pattern = format!("adaptive_memory:{tenant_id}:*");
        let filter = ScanFilter::eq(crate::store::FieldRef::one("agentId"), Value::String(agent_id.to_string()));
        let mut claims: Vec<Claim> = self.store.scan_as(&pattern, Some(&filter))?;
        claims.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        claims.truncate(CONTEXT_WINDOW);
        Ok(claims)
    }

    /// `store(tenant, agent, content, surprise_signal, metadata) → id` (spec §4.F).
    #[allow(clippy::too_many_arguments)]
    pub fn store_claim(
        &self,
        tenant_id: &str,
        agent_id: &str,
        content: ClaimContent,
        confidence: Confidence,
        evidence: Vec<Evidence>,
        surprise_signal: Option<f64>,
        metadata: HashMap<String, Value>,
    ) -> Result<String> {
        let now = Utc::now();
        let context = self.recent_claims_for_agent(tenant_id, agent_id)?;
        let context_claims: Vec<ContextClaim> = context
            .iter()
            .map(|c| ContextClaim { text: c.content.joined_text(), confidence_mean: c.confidence.mean })
            .collect();
        let previous_confidence = context.first().map(|c| c.confidence);

        let (surprise_score, components, degraded) = match surprise_signal {
            Some(signal) => (clip(signal, 0.0, 1.0), SurpriseComponents::default(), false),
            None => {
                let inputs = surprise::SurpriseInputs {
                    new_text: content.joined_text(),
                    new_confidence: confidence,
                    previous_confidence,
                    evidence_quality: evidence.iter().map(|e| e.quality).collect(),
                    beliefs: &context_claims,
                    context: &context_claims,
                };
                let result = surprise::compute(&inputs, &SurpriseWeights::default(), Some(self.provider.as_ref()));
                (result.composite, result.components, result.degraded)
            }
        };

        let layer = Layer::from_surprise(surprise_score);
        let id = Claim::new_id();
        let claim = Claim {
            id: id.clone(),
            tenant_id: tenant_id.to_string(),
            agent_id: agent_id.to_string(),
            content,
            timestamp: now,
            surprise_signal,
            surprise_score,
            surprise_components: components,
            importance: surprise_score,
            layer,
            metadata,
            access_count: 0,
            last_access: now,
            retention_status: RetentionStatus::Active,
            evidence,
            contradiction_count: 0,
            confidence,
            compression_level: None,
            compression_strategy: None,
            compression_ratio: None,
            original_ref: None,
            promoted_at: None,
            promotion_reason: None,
        };

        self.store.put_typed(&keys::claim(tenant_id, &id), &claim, WriteMeta::new(tenant_id, "adaptive_memory"))?;
        self.store.add_to_set(&keys::surprise_index(tenant_id, keys::surprise_bucket(surprise_score)), &id)?;
        self.store.add_to_set(&keys::layer_index(tenant_id, layer.as_str()), &id)?;

        if degraded {
            tracing::warn!(tenant_id, claim_id = %id, "surprise scoring fell back to heuristics (no provider or provider miss)");
        }

        let mut audit_data = HashMap::new();
        audit_data.insert("claimId".to_string(), Value::String(id.clone()));
        audit_data.insert("surpriseScore".to_string(), serde_json::json!(surprise_score));
        audit_data.insert("degraded".to_string(), Value::Bool(degraded));
        self.audit.log(tenant_id, "adaptive_store", &audit_data, &AuditContext { actor: Some(agent_id.to_string()), ..Default::default() })?;

        // spec §6.4: "If null, the core records a pending marker in the
        // store" — a dispatcher that actually queued the job doesn't need
        // the fallback marker too.
        if self.dispatcher.dispatch_retention_evaluation(tenant_id, &id, now)?.is_none() {
            self.store.add_to_set(&keys::retention_eval_pending(tenant_id), &id)?;
        }

        Ok(id)
    }

    fn load_claim(&self, tenant_id: &str, id: &str) -> Result<Claim> {
        self.store
            .get_as::<Claim>(&keys::claim(tenant_id, id))?
            .ok_or_else(|| CoreError::NotFound(format!("claim {tenant_id}:{id}")))
    }

    fn move_layer_index(&self, tenant_id: &str, id: &str, from: Layer, to: Layer) -> Result<()> {
        if from != to {
            self.store.remove_from_set(&keys::layer_index(tenant_id, from.as_str()), id)?;
            self.store.add_to_set(&keys::layer_index(tenant_id, to.as_str()), id)?;
        }
        Ok(())
    }

    /// `promoteToActiveMemory(id, reason)`: layer=hot, importance ×1.2
    /// clipped, stamps `promoted_at`/`promotion_reason` (spec §4.F).
    pub fn promote_to_active(&self, tenant_id: &str, id: &str, reason: &str) -> Result<()> {
        let mut claim = self.load_claim(tenant_id, id)?;
        let previous_layer = claim.layer;
        claim.layer = Layer::Hot;
        claim.importance = clip(claim.importance * PROMOTION_IMPORTANCE_MULTIPLIER, 0.0, 1.0);
        claim.retention_status = RetentionStatus::PromotedToActive;
        claim.promoted_at = Some(Utc::now());
        claim.promotion_reason = Some(reason.to_string());

        self.store.put_typed(&keys::claim(tenant_id, id), &claim, WriteMeta::new(tenant_id, "adaptive_memory"))?;
        self.move_layer_index(tenant_id, id, previous_layer, Layer::Hot)?;

        let mut data = HashMap::new();
        data.insert("claimId".to_string(), Value::String(id.to_string()));
        data.insert("reason".to_string(), Value::String(reason.to_string()));
        self.audit.log(tenant_id, "promote", &data, &AuditContext::default())?;
        Ok(())
    }

    /// `demoteToCompressedMemory` — symmetric to promotion (spec §4.F).
    pub fn demote_to_compressed(&self, tenant_id: &str, id: &str) -> Result<()> {
        let mut claim = self.load_claim(tenant_id, id)?;
        let previous_layer = claim.layer;
        claim.layer = Layer::Cold;
        claim.importance = clip(claim.importance * DEMOTION_IMPORTANCE_MULTIPLIER, 0.0, 1.0);
        claim.retention_status = RetentionStatus::CompressedToCold;

        self.store.put_typed(&keys::claim(tenant_id, id), &claim, WriteMeta::new(tenant_id, "adaptive_memory"))?;
        self.move_layer_index(tenant_id, id, previous_layer, Layer::Cold)?;

        let mut data = HashMap::new();
        data.insert("claimId".to_string(), Value::String(id.to_string()));
        self.audit.log(tenant_id, "demote", &data, &AuditContext::default())?;
        Ok(())
    }

    /// `queryBySurprise(thresholds, filters)`: scan + filter on
    /// layer/agent/importance/surprise range, sorted by surprise descending
    /// (spec §4.F).
    pub fn query_by_surprise(&self, tenant_id: &str, surprise_range: (f64, f64), filters: &QueryFilters) -> Result<Vec<Claim>> {
        let pattern = format!("adaptive_memory:{tenant_id}:*");
        let mut claims: Vec<Claim> = self.store.scan_as(&pattern, None)?;
        claims.retain(|c| c.surprise_score >= surprise_range.0 && c.surprise_score <= surprise_range.1);
        if let Some(layer) = filters.layer {
            claims.retain(|c| c.layer == layer);
        }
        if let Some(agent_id) = &filters.agent_id {
            claims.retain(|c| &c.agent_id == agent_id);
        }
        if let Some((lo, hi)) = filters.importance_range {
            claims.retain(|c| c.importance >= lo && c.importance <= hi);
        }
        claims.sort_by(|a, b| b.surprise_score.partial_cmp(&a.surprise_score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(claims)
    }

    /// Evaluate and act on one pending claim: apply decay (§4.C), then
    /// promote / compress / leave as-is per the retention decision (§4.C,
    /// §4.D). Returns the decision taken so the sweep can tally it.
    fn evaluate_and_act(&self, tenant_id: &str, id: &str, policy: &RetentionPolicy, now: chrono::DateTime<Utc>) -> Result<RetentionDecision> {
        let mut claim = self.load_claim(tenant_id, id)?;
        let eval = retention::evaluate(&claim, &policy.retention_weights, policy.promotion_threshold, policy.compression_threshold, policy.temporal_half_life_days, now);
        retention::apply_decay(&mut claim, policy.decay_rate, now);

        match eval.decision {
            RetentionDecision::PromoteToActive => {
                self.store.put_typed(&keys::claim(tenant_id, id), &claim, WriteMeta::new(tenant_id, "adaptive_memory"))?;
                self.promote_to_active(tenant_id, id, "retention sweep: score above promotion threshold")?;
            }
            RetentionDecision::CompressToCold => {
                let previous_layer = claim.layer;
                compression::compress_claim(&mut claim, &self.store, self.provider.as_ref(), SWEEP_COMPRESSION_LEVEL, &CompressionCriteria::default())?;
                claim.layer = Layer::Cold;
                claim.importance = clip(claim.importance * DEMOTION_IMPORTANCE_MULTIPLIER, 0.0, 1.0);
                claim.retention_status = RetentionStatus::CompressedToCold;
                self.store.put_typed(&keys::claim(tenant_id, id), &claim, WriteMeta::new(tenant_id, "adaptive_memory"))?;
                self.move_layer_index(tenant_id, id, previous_layer, Layer::Cold)?;
                let _ = self.dispatcher.dispatch_summarization(tenant_id, id, Layer::Cold.as_str())?;

                let mut data = HashMap::new();
                data.insert("claimId".to_string(), Value::String(id.to_string()));
                data.insert("compressionLevel".to_string(), serde_json::json!(SWEEP_COMPRESSION_LEVEL));
                self.audit.log(tenant_id, "retention_decay_compress", &data, &AuditContext::default())?;
            }
            RetentionDecision::Maintain => {
                self.store.put_typed(&keys::claim(tenant_id, id), &claim, WriteMeta::new(tenant_id, "adaptive_memory"))?;
            }
        }

        Ok(eval.decision)
    }

    /// Scans `retention_eval_pending:{tenant}` and evaluates every pending
    /// claim (spec §4.F "schedule retention evaluation"; spec §2 data flow
    /// "later scanned by C to be decayed / promoted / compressed via D").
    /// Partial-failure tolerant: a failing item is skipped, counted, and
    /// reported rather than aborting the sweep (spec §7 "Decay/compression
    /// sweeps are partial-failure tolerant").
    pub fn run_retention_sweep(&self, tenant_id: &str, policy: &RetentionPolicy) -> Result<RetentionSweepSummary> {
        let pending_key = keys::retention_eval_pending(tenant_id);
        let ids = self.store.set_members(&pending_key)?;
        let now = Utc::now();
        let mut summary = RetentionSweepSummary::default();

        for id in ids {
            summary.evaluated += 1;
            match self.evaluate_and_act(tenant_id, &id, policy, now) {
                Ok(RetentionDecision::PromoteToActive) => summary.promoted += 1,
                Ok(RetentionDecision::CompressToCold) => summary.compressed += 1,
                Ok(RetentionDecision::Maintain) => summary.maintained += 1,
                Err(err) => {
                    summary.failed += 1;
                    tracing::warn!(tenant_id, claim_id = %id, error = %err, "retention sweep skipped item");
                }
            }
            // Cleared unconditionally: a claim that failed this pass (e.g. it
            // was deleted out from under us) would fail identically on every
            // future sweep otherwise. `store_claim` re-adds the marker for
            // any claim that needs evaluating again.
            let _ = self.store.remove_from_set(&pending_key, &id);
        }

        Ok(summary)
    }
}

/// Result of [`AdaptiveMemoryOrchestrator::run_retention_sweep`] (spec §7
/// "a failing item is skipped, counted, and reported in the sweep summary").
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionSweepSummary {
    pub evaluated: usize,
    pub promoted: usize,
    pub compressed: usize,
    pub maintained: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopAuditSink;
    use crate::dispatcher::NoopDispatcher;
    use crate::provider::HeuristicProvider;
    use crate::store::InMemoryStore;

    fn orchestrator() -> AdaptiveMemoryOrchestrator {
        AdaptiveMemoryOrchestrator::new(
            StoreFacade::new(Arc::new(InMemoryStore::new())),
            Arc::new(HeuristicProvider),
            Arc::new(NoopAuditSink),
            Arc::new(NoopDispatcher),
        )
    }

    #[test]
    fn storing_a_fresh_claim_lands_in_hot_or_warm() {
        let orch = orchestrator();
        let confidence = Confidence::new(0.7, 0.85, 0.78).unwrap();
        let id = orch
            .store_claim("acme", "agent_1", ClaimContent::text("X is risky"), confidence, vec![], None, HashMap::new())
            .unwrap();

        let claim = orch.load_claim("acme", &id).unwrap();
        assert!(claim.surprise_score >= 0.5, "surprise={}", claim.surprise_score);
        assert!(matches!(claim.layer, Layer::Hot | Layer::Warm));

        let bucket = keys::surprise_bucket(claim.surprise_score);
        let members = orch.store.set_members(&keys::surprise_index("acme", bucket)).unwrap();
        assert!(members.contains(&id));
    }

    #[test]
    fn promote_sets_hot_layer_and_boosts_importance() {
        let orch = orchestrator();
        let confidence = Confidence::new(0.5, 0.6, 0.55).unwrap();
        let id = orch
            .store_claim("acme", "agent_1", ClaimContent::text("some neutral claim text"), confidence, vec![], Some(0.3), HashMap::new())
            .unwrap();
        let before = orch.load_claim("acme", &id).unwrap();

        orch.promote_to_active("acme", &id, "manual review").unwrap();
        let after = orch.load_claim("acme", &id).unwrap();

        assert_eq!(after.layer, Layer::Hot);
        assert!(after.importance >= before.importance);
        assert!(after.promoted_at.is_some());
    }

    #[test]
    fn retention_sweep_promotes_high_surprise_and_clears_pending() {
        // Surprise alone (weight 0.25) can't clear the 0.7 promotion
        // threshold; stored directly so contradiction/evidence can also be
        // set, the way a claim would look after J has flagged it contested.
        let orch = orchestrator();
        let now = Utc::now();
        let claim = Claim {
            id: "amem_1".into(),
            tenant_id: "acme".into(),
            agent_id: "agent_1".into(),
            content: ClaimContent::text("X is risky"),
            timestamp: now,
            surprise_signal: Some(0.9),
            surprise_score: 0.9,
            surprise_components: SurpriseComponents::default(),
            importance: 0.5,
            layer: Layer::Hot,
            metadata: HashMap::new(),
            access_count: 10,
            last_access: now,
            retention_status: RetentionStatus::Active,
            evidence: (0..5).map(|_| Evidence { content: "e".into(), quality: 0.8, source: None }).collect(),
            contradiction_count: 3,
            confidence: Confidence::new(0.8, 0.9, 0.85).unwrap(),
            compression_level: None,
            compression_strategy: None,
            compression_ratio: None,
            original_ref: None,
            promoted_at: None,
            promotion_reason: None,
        };
        orch.store.put_typed(&keys::claim("acme", &claim.id), &claim, WriteMeta::new("acme", "adaptive_memory")).unwrap();
        orch.store.add_to_set(&keys::retention_eval_pending("acme"), &claim.id).unwrap();

        let summary = orch.run_retention_sweep("acme", &RetentionPolicy::default()).unwrap();
        assert_eq!(summary.evaluated, 1);
        assert_eq!(summary.promoted, 1);
        assert!(orch.store.set_members(&keys::retention_eval_pending("acme")).unwrap().is_empty());

        let after = orch.load_claim("acme", &claim.id).unwrap();
        assert_eq!(after.layer, Layer::Hot);
        assert_eq!(after.retention_status, RetentionStatus::PromotedToActive);
    }

    #[test]
    fn retention_sweep_compresses_low_scoring_claims() {
        let orch = orchestrator();
        let confidence = Confidence::new(0.45, 0.55, 0.5).unwrap();
        let id = orch
            .store_claim(
                "acme",
                "agent_1",
                ClaimContent::text("A mundane observation. Nothing unusual here at all. Just routine."),
                confidence,
                vec![],
                Some(0.05),
                HashMap::new(),
            )
            .unwrap();

        let summary = orch.run_retention_sweep("acme", &RetentionPolicy::default()).unwrap();
        assert_eq!(summary.compressed, 1);

        let after = orch.load_claim("acme", &id).unwrap();
        assert_eq!(after.layer, Layer::Cold);
        assert!(after.compression_level.is_some());
        assert!(after.original_ref.is_some());
    }
}
