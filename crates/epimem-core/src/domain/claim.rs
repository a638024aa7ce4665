//! Claim — the stored memory unit (spec §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::confidence::Confidence;
use super::layer::Layer;

/// Opaque-payload content plus the normalized textual assertions extracted
/// from it (spec §3: "`content` (opaque payload + optional `claims[]` list
/// of normalized textual assertions)").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClaimContent {
    /// Caller-supplied payload. Schema is genuinely open here (spec §9:
    /// "Keep a single opaque-blob field only for provider-supplied
    /// `attributes` where schema is genuinely open").
    #[serde(default)]
    pub payload: Value,
    /// Normalized textual assertions extracted from `payload`.
    #[serde(default)]
    pub claims: Vec<String>,
}

impl ClaimContent {
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            payload: Value::String(text.clone()),
            claims: vec![text],
        }
    }

    /// All claim text joined, used by lexical fallbacks (novelty, overlap).
    pub fn joined_text(&self) -> String {
        self.claims.join(" ")
    }
}

/// A piece of evidence backing a claim (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub content: String,
    /// Quality in `[0,1]`.
    pub quality: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Named contributions to the composite surprise score (spec §4.B).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SurpriseComponents {
    pub novelty: f64,
    pub contradiction: f64,
    pub evidence: f64,
    pub confidence_shift: f64,
    pub disagreement: f64,
}

/// Where a claim currently stands in the retention pipeline (spec §4.C/§4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RetentionStatus {
    #[default]
    Active,
    PromotedToActive,
    CompressedToCold,
    Maintained,
}

/// The stored memory unit (spec §3 "Claim").
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// Opaque id, `amem_` prefixed.
    pub id: String,
    pub tenant_id: String,
    pub agent_id: String,
    pub content: ClaimContent,
    pub timestamp: DateTime<Utc>,
    /// Surprise signal as received from the caller, before composite scoring.
    #[serde(default)]
    pub surprise_signal: Option<f64>,
    pub surprise_score: f64,
    pub surprise_components: SurpriseComponents,
    pub importance: f64,
    pub layer: Layer,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub access_count: u64,
    pub last_access: DateTime<Utc>,
    pub retention_status: RetentionStatus,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub contradiction_count: u32,
    pub confidence: Confidence,

    // Present only after compression (spec §3).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_ref: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_reason: Option<String>,
}

impl Claim {
    pub fn id_prefix() -> &'static str {
        "amem_"
    }

    pub fn new_id() -> String {
        format!("{}{}", Self::id_prefix(), uuid::Uuid::new_v4())
    }

    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.timestamp).num_seconds() as f64 / 86_400.0
    }

    pub fn days_since_access(&self, now: DateTime<Utc>) -> f64 {
        (now - self.last_access).num_seconds() as f64 / 86_400.0
    }

    /// Whether this claim is flagged as contested by its evidence/metadata
    /// (spec §4.M: "is not flagged `is_contested`").
    pub fn is_contested(&self) -> bool {
        self.metadata
            .get("is_contested")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_content_joined_text() {
        let content = ClaimContent {
            payload: Value::Null,
            claims: vec!["a".into(), "b".into()],
        };
        assert_eq!(content.joined_text(), "a b");
    }

    #[test]
    fn new_id_has_expected_prefix() {
        assert!(Claim::new_id().starts_with("amem_"));
    }
}
