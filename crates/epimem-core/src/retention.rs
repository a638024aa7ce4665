//! Retention gate (spec §4.C).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RetentionWeights;
use crate::domain::Claim;
use crate::text::clip;

/// The six retention factors, each in `[0,1]` (spec §4.C).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionFactors {
    pub surprise: f64,
    pub confidence: f64,
    pub contradiction: f64,
    pub temporal: f64,
    pub usage: f64,
    pub evidence: f64,
}

/// Gate outcome (spec §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionDecision {
    PromoteToActive,
    CompressToCold,
    Maintain,
}

/// Full result of evaluating one claim (factors, weighted score, decision).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionEvaluation {
    pub factors: RetentionFactors,
    pub score: f64,
    pub decision: RetentionDecision,
}

fn temporal_factor(age_days: f64, half_life_days: f64) -> f64 {
    (-std::f64::consts::LN_2 * age_days / half_life_days).exp()
}

fn usage_factor(access_count: u64, days_since_access: f64) -> f64 {
    let recency = 0.6 * clip((1.0 + access_count as f64).ln() / 100f64.ln(), 0.0, 1.0);
    let immediacy = 0.4 * (1.0 / (1.0 + days_since_access));
    recency + immediacy
}

fn evidence_factor(evidence_count: usize) -> f64 {
    clip((1.0 + evidence_count as f64).ln() / 20f64.ln(), 0.0, 1.0)
}

/// `max(mean, 1 - mean)` — both high confidence and high uncertainty are
/// worth retaining; only middling certainty scores low (spec §4.C:
/// "high OR complement-of-low — uncertainty is valuable").
fn confidence_factor(mean: f64) -> f64 {
    mean.max(1.0 - mean)
}

fn contradiction_factor(contradiction_count: u32) -> f64 {
    clip(contradiction_count as f64 * 0.2, 0.0, 1.0)
}

/// Evaluate the six retention factors and the weighted decision for one
/// claim at time `now` (spec §4.C).
pub fn evaluate(claim: &Claim, weights: &RetentionWeights, promotion_threshold: f64, compression_threshold: f64, half_life_days: f64, now: DateTime<Utc>) -> RetentionEvaluation {
    let factors = RetentionFactors {
        surprise: claim.surprise_score,
        confidence: confidence_factor(claim.confidence.mean),
        contradiction: contradiction_factor(claim.contradiction_count),
        temporal: temporal_factor(claim.age_days(now), half_life_days),
        usage: usage_factor(claim.access_count, claim.days_since_access(now)),
        evidence: evidence_factor(claim.evidence.len()),
    };

    let total_w = weights.surprise + weights.confidence + weights.contradiction + weights.temporal + weights.usage + weights.evidence;
    let score = (weights.surprise * factors.surprise
        + weights.confidence * factors.confidence
        + weights.contradiction * factors.contradiction
        + weights.temporal * factors.temporal
        + weights.usage * factors.usage
        + weights.evidence * factors.evidence)
        / total_w;

    let decision = if score >= promotion_threshold {
        RetentionDecision::PromoteToActive
    } else if score < compression_threshold {
        RetentionDecision::CompressToCold
    } else {
        RetentionDecision::Maintain
    };

    RetentionEvaluation { factors, score, decision }
}

/// `importance *= exp(-decay_rate·age_days / (1+surprise))` — high surprise
/// decays slower (spec §4.C).
pub fn apply_decay(claim: &mut Claim, decay_rate: f64, now: DateTime<Utc>) {
    let age_days = claim.age_days(now);
    let factor = (-decay_rate * age_days / (1.0 + claim.surprise_score)).exp();
    claim.importance = clip(claim.importance * factor, 0.0, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetentionPolicy;
    use crate::domain::{ClaimContent, Confidence, Layer, RetentionStatus};

    fn sample_claim() -> Claim {
        let now = Utc::now();
        Claim {
            id: "amem_1".into(),
            tenant_id: "acme".into(),
            agent_id: "agent_1".into(),
            content: ClaimContent::text("X is risky"),
            timestamp: now,
            surprise_signal: None,
            surprise_score: 0.8,
            surprise_components: Default::default(),
            importance: 0.5,
            layer: Layer::Hot,
            metadata: Default::default(),
            access_count: 10,
            last_access: now,
            retention_status: RetentionStatus::Active,
            evidence: vec![],
            contradiction_count: 0,
            confidence: Confidence::new(0.7, 0.85, 0.78).unwrap(),
            compression_level: None,
            compression_strategy: None,
            compression_ratio: None,
            original_ref: None,
            promoted_at: None,
            promotion_reason: None,
        }
    }

    // Surprise alone (0.25 weight) can't clear the 0.7 promotion threshold;
    // a claim only promotes when it is also contradicted and well-evidenced.
    fn contested_claim() -> Claim {
        let mut claim = sample_claim();
        claim.surprise_score = 0.9;
        claim.contradiction_count = 3;
        claim.evidence = (0..5).map(|_| crate::domain::Evidence { content: "e".into(), quality: 0.8, source: None }).collect();
        claim.confidence = Confidence::new(0.8, 0.9, 0.85).unwrap();
        claim
    }

    #[test]
    fn high_surprise_recent_claim_promotes() {
        let claim = contested_claim();
        let policy = RetentionPolicy::default();
        let eval = evaluate(&claim, &policy.retention_weights, policy.promotion_threshold, policy.compression_threshold, policy.temporal_half_life_days, Utc::now());
        assert_eq!(eval.decision, RetentionDecision::PromoteToActive);
    }

    #[test]
    fn decay_reduces_importance_over_time() {
        let mut claim = sample_claim();
        claim.timestamp = Utc::now() - chrono::Duration::days(30);
        let before = claim.importance;
        apply_decay(&mut claim, 0.05, Utc::now());
        assert!(claim.importance < before);
    }

    #[test]
    fn confidence_factor_rewards_extremes() {
        assert!((confidence_factor(0.9) - 0.9).abs() < 1e-9);
        assert!((confidence_factor(0.1) - 0.9).abs() < 1e-9);
        assert!((confidence_factor(0.5) - 0.5).abs() < 1e-9);
    }
}
