//! Per-tenant configuration (spec §6.5).
//!
//! Mirrors `vestige-core`'s consolidation-config pattern: one `#[non_exhaustive]`
//! struct with spec-mandated defaults, stored at `retention_policy:{tenant}`
//! (see [`crate::keys::retention_policy`]) and validated on update rather
//! than on every read.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Weights for the six retention factors (spec §4.C). Default
/// `0.25/0.15/0.20/0.15/0.15/0.10`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetentionWeights {
    pub surprise: f64,
    pub confidence: f64,
    pub contradiction: f64,
    pub temporal: f64,
    pub usage: f64,
    pub evidence: f64,
}

impl Default for RetentionWeights {
    fn default() -> Self {
        Self {
            surprise: 0.25,
            confidence: 0.15,
            contradiction: 0.20,
            temporal: 0.15,
            usage: 0.15,
            evidence: 0.10,
        }
    }
}

/// Promotion gate parameters (spec §4.M). Defaults `min_confidence=0.7`,
/// `min_agreement=0.6`, `require_evidence=true`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromotionCriteria {
    pub min_confidence: f64,
    pub min_agreement: f64,
    pub require_evidence: bool,
}

impl Default for PromotionCriteria {
    fn default() -> Self {
        Self { min_confidence: 0.7, min_agreement: 0.6, require_evidence: true }
    }
}

/// Per-tenant retention policy (spec §6.5, stored at `retention_policy:{t}`).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicy {
    pub retention_weights: RetentionWeights,
    pub promotion_threshold: f64,
    pub compression_threshold: f64,
    pub compression_age_days: f64,
    pub confidence_retention_threshold: f64,
    pub temporal_half_life_days: f64,
    pub decay_rate: f64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention_weights: RetentionWeights::default(),
            promotion_threshold: 0.7,
            compression_threshold: 0.3,
            compression_age_days: 30.0,
            confidence_retention_threshold: 0.3,
            temporal_half_life_days: 14.0,
            decay_rate: 0.05,
        }
    }
}

/// Caller-supplied patch for `updateRetentionPolicy`. Uses `Option` fields
/// so a partial JSON payload can be validated before being merged onto the
/// stored policy (spec §6.5: "rejects a payload missing any of
/// `retention_weights`, `promotion_threshold`, `compression_threshold`" —
/// i.e. those three are mandatory, the rest stay optional overrides).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RetentionPolicyUpdate {
    pub retention_weights: Option<RetentionWeights>,
    pub promotion_threshold: Option<f64>,
    pub compression_threshold: Option<f64>,
    pub compression_age_days: Option<f64>,
    pub confidence_retention_threshold: Option<f64>,
    pub temporal_half_life_days: Option<f64>,
    pub decay_rate: Option<f64>,
}

impl RetentionPolicyUpdate {
    /// Rejects a payload missing any of the three mandatory fields (spec §6.5).
    pub fn validate(&self) -> Result<()> {
        if self.retention_weights.is_none() {
            return Err(CoreError::InvalidArgument("retention_weights is required".into()));
        }
        if self.promotion_threshold.is_none() {
            return Err(CoreError::InvalidArgument("promotion_threshold is required".into()));
        }
        if self.compression_threshold.is_none() {
            return Err(CoreError::InvalidArgument("compression_threshold is required".into()));
        }
        Ok(())
    }

    /// Merge onto an existing policy after validation, keeping whatever the
    /// caller did not set.
    pub fn apply_to(self, mut base: RetentionPolicy) -> Result<RetentionPolicy> {
        self.validate()?;
        base.retention_weights = self.retention_weights.unwrap();
        base.promotion_threshold = self.promotion_threshold.unwrap();
        base.compression_threshold = self.compression_threshold.unwrap();
        if let Some(v) = self.compression_age_days {
            base.compression_age_days = v;
        }
        if let Some(v) = self.confidence_retention_threshold {
            base.confidence_retention_threshold = v;
        }
        if let Some(v) = self.temporal_half_life_days {
            base.temporal_half_life_days = v;
        }
        if let Some(v) = self.decay_rate {
            base.decay_rate = v;
        }
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let p = RetentionPolicy::default();
        assert_eq!(p.promotion_threshold, 0.7);
        assert_eq!(p.compression_threshold, 0.3);
        assert_eq!(p.retention_weights.surprise, 0.25);
        assert_eq!(p.retention_weights.contradiction, 0.20);
    }

    #[test]
    fn update_requires_mandatory_fields() {
        let patch = RetentionPolicyUpdate {
            retention_weights: None,
            promotion_threshold: Some(0.8),
            compression_threshold: Some(0.2),
            compression_age_days: None,
            confidence_retention_threshold: None,
            temporal_half_life_days: None,
            decay_rate: None,
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn update_merges_partial_optional_fields() {
        let patch = RetentionPolicyUpdate {
            retention_weights: Some(RetentionWeights::default()),
            promotion_threshold: Some(0.8),
            compression_threshold: Some(0.25),
            compression_age_days: None,
            confidence_retention_threshold: None,
            temporal_half_life_days: Some(7.0),
            decay_rate: None,
        };
        let merged = patch.apply_to(RetentionPolicy::default()).unwrap();
        assert_eq!(merged.promotion_threshold, 0.8);
        assert_eq!(merged.temporal_half_life_days, 7.0);
        assert_eq!(merged.decay_rate, RetentionPolicy::default().decay_rate);
    }
}
