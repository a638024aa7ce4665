//! Hierarchical compression (spec §4.D).

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::Claim;
use crate::error::{CoreError, Result};
use crate::keys;
use crate::provider::{AiProvider, SummarizeOptions};
use crate::store::{StoreFacade, WriteMeta};
use crate::text::clip;

/// Target content-size ratio per compression level (spec §4.D):
/// `L0 none, L1 0.7, L2 0.4, L3 0.2, L4 0.1`.
pub const COMPRESSION_RATIOS: [f64; 5] = [1.0, 0.7, 0.4, 0.2, 0.1];

const DETAILED_STRATEGIES: [&str; 4] = ["selective_detail", "key_points", "core_summary", "minimal_reference"];
const STANDARD_STRATEGIES: [&str; 4] = ["standard", "aggressive", "extreme", "reference_only"];

/// Flags steering what the summarizer is told to preserve (spec §4.D,
/// §6.2 `summarize` options).
#[derive(Debug, Clone, Copy)]
pub struct CompressionCriteria {
    pub preserve_high_confidence: bool,
    pub preserve_contradictions: bool,
    pub preserve_evidence: bool,
    pub preserve_intent: bool,
}

impl Default for CompressionCriteria {
    fn default() -> Self {
        Self {
            preserve_high_confidence: true,
            preserve_contradictions: true,
            preserve_evidence: true,
            preserve_intent: true,
        }
    }
}

/// `max(surprise, 0.8 if contradictions, 0.7 if |evidence|>3, 0.9 if
/// criteria.preserve_high_confidence && conf.mean>0.8, else 0.5)` (spec §4.D).
pub fn preservation_score(claim: &Claim, criteria: &CompressionCriteria) -> f64 {
    let mut candidates = vec![claim.surprise_score, 0.5];
    if claim.contradiction_count > 0 {
        candidates.push(0.8);
    }
    if claim.evidence.len() > 3 {
        candidates.push(0.7);
    }
    if criteria.preserve_high_confidence && claim.confidence.mean > 0.8 {
        candidates.push(0.9);
    }
    candidates.into_iter().fold(f64::MIN, f64::max)
}

/// Pick the per-level strategy name for `level ∈ {1..4}` (spec §4.D).
pub fn strategy_for_level(level: u8, surprise: f64, preservation: f64) -> &'static str {
    let idx = (level.clamp(1, 4) - 1) as usize;
    if surprise.max(preservation) > 0.7 {
        DETAILED_STRATEGIES[idx]
    } else {
        STANDARD_STRATEGIES[idx]
    }
}

/// Hierarchy level (0..3) from a raw surprise score, used by
/// `createHierarchicalSummary` (spec §4.D): thresholds `0.7/0.5/0.3`.
pub fn hierarchy_level_for_surprise(surprise: f64) -> u8 {
    if surprise >= 0.7 {
        0
    } else if surprise >= 0.5 {
        1
    } else if surprise >= 0.3 {
        2
    } else {
        3
    }
}

/// Sort memories by surprise descending and bucket them into hierarchy
/// levels 0..3 (spec §4.D `createHierarchicalSummary`).
pub fn create_hierarchical_summary(claims: &[Claim]) -> [Vec<String>; 4] {
    let mut sorted: Vec<&Claim> = claims.iter().collect();
    sorted.sort_by(|a, b| b.surprise_score.partial_cmp(&a.surprise_score).unwrap_or(std::cmp::Ordering::Equal));
    let mut levels: [Vec<String>; 4] = Default::default();
    for claim in sorted {
        let level = hierarchy_level_for_surprise(claim.surprise_score) as usize;
        levels[level].push(claim.id.clone());
    }
    levels
}

/// Compress `claim` in place to `level ∈ {1..4}`, preserving the
/// pre-compression record at `original_memory:{tenant}:{id}_original` so
/// decompression is lossless (spec §4.D, §8 "Decompression law").
pub fn compress_claim(
    claim: &mut Claim,
    store: &StoreFacade,
    provider: &dyn AiProvider,
    level: u8,
    criteria: &CompressionCriteria,
) -> Result<()> {
    if !(1..=4).contains(&level) {
        return Err(CoreError::InvalidArgument(format!("compression level must be 1..4, got {level}")));
    }

    let original_key = keys::original_memory(&claim.tenant_id, &claim.id);
    store.put_typed(&original_key, claim, WriteMeta::new(&claim.tenant_id, "original_memory").immutable())?;

    let preservation = preservation_score(claim, criteria);
    let ratio = COMPRESSION_RATIOS[level as usize];
    let strategy = strategy_for_level(level, claim.surprise_score, preservation);

    let opts = SummarizeOptions {
        target_compression: ratio,
        preserve_contradictions: criteria.preserve_contradictions,
        preserve_evidence: criteria.preserve_evidence,
        preserve_intent: criteria.preserve_intent,
    };
    let summary = provider.summarize(&claim.content.joined_text(), &opts)?;

    claim.content.claims = vec![summary];
    claim.compression_level = Some(level);
    claim.compression_strategy = Some(strategy.to_string());
    claim.compression_ratio = Some(ratio);
    claim.original_ref = Some(original_key);

    Ok(())
}

/// Restore the pre-compression record for `claim_id` (spec §8
/// "Decompression law": `decompress(compress(c, level)) == c`).
pub fn decompress_claim(tenant_id: &str, claim: &Claim, store: &StoreFacade) -> Result<Claim> {
    let Some(original_ref) = &claim.original_ref else {
        return Err(CoreError::InvalidArgument(format!("claim {} has no original_ref", claim.id)));
    };
    store
        .get_as::<Claim>(original_ref)?
        .ok_or_else(|| CoreError::NotFound(format!("original record for {tenant_id}:{}", claim.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClaimContent, Confidence, Layer, RetentionStatus};
    use crate::provider::HeuristicProvider;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn sample_claim(surprise: f64) -> Claim {
        let now = Utc::now();
        Claim {
            id: "amem_1".into(),
            tenant_id: "acme".into(),
            agent_id: "agent_1".into(),
            content: ClaimContent::text("Blogging is legally risky. It may expose the author to liability. Courts have ruled inconsistently."),
            timestamp: now,
            surprise_signal: None,
            surprise_score: surprise,
            surprise_components: Default::default(),
            importance: 0.5,
            layer: Layer::Hot,
            metadata: Default::default(),
            access_count: 1,
            last_access: now,
            retention_status: RetentionStatus::Active,
            evidence: vec![],
            contradiction_count: 0,
            confidence: Confidence::new(0.6, 0.9, 0.78).unwrap(),
            compression_level: None,
            compression_strategy: None,
            compression_ratio: None,
            original_ref: None,
            promoted_at: None,
            promotion_reason: None,
        }
    }

    #[test]
    fn compress_then_decompress_restores_original() {
        let store = StoreFacade::new(Arc::new(InMemoryStore::new()));
        let provider = HeuristicProvider;
        let mut claim = sample_claim(0.8);
        let original = claim.clone();

        compress_claim(&mut claim, &store, &provider, 2, &CompressionCriteria::default()).unwrap();
        assert_eq!(claim.compression_level, Some(2));
        assert_eq!(claim.compression_ratio, Some(0.4));

        let restored = decompress_claim("acme", &claim, &store).unwrap();
        assert_eq!(restored.id, original.id);
        assert_eq!(restored.content.claims, original.content.claims);
        assert!(restored.compression_level.is_none());
    }

    #[test]
    fn hierarchy_levels_follow_thresholds() {
        assert_eq!(hierarchy_level_for_surprise(0.9), 0);
        assert_eq!(hierarchy_level_for_surprise(0.6), 1);
        assert_eq!(hierarchy_level_for_surprise(0.35), 2);
        assert_eq!(hierarchy_level_for_surprise(0.1), 3);
    }

    #[test]
    fn high_surprise_picks_detailed_strategies() {
        assert_eq!(strategy_for_level(1, 0.9, 0.5), "selective_detail");
        assert_eq!(strategy_for_level(4, 0.9, 0.5), "minimal_reference");
        assert_eq!(strategy_for_level(1, 0.1, 0.2), "standard");
    }
}
