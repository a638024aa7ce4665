//! Epistemic status — the closed set claims and entities move through
//! (spec §3 "Epistemic status record", Glossary).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};

/// `{hypothesis, evidence, assumption, decision, rejected, confirmed, contested}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EpistemicStatus {
    #[default]
    Hypothesis,
    Evidence,
    Assumption,
    Decision,
    Rejected,
    Confirmed,
    Contested,
}

impl EpistemicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpistemicStatus::Hypothesis => "hypothesis",
            EpistemicStatus::Evidence => "evidence",
            EpistemicStatus::Assumption => "assumption",
            EpistemicStatus::Decision => "decision",
            EpistemicStatus::Rejected => "rejected",
            EpistemicStatus::Confirmed => "confirmed",
            EpistemicStatus::Contested => "contested",
        }
    }

    /// Parse a caller-supplied status string, rejecting unknown values
    /// (spec §7 `InvalidArgument`: "status outside the closed set").
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hypothesis" => Ok(EpistemicStatus::Hypothesis),
            "evidence" => Ok(EpistemicStatus::Evidence),
            "assumption" => Ok(EpistemicStatus::Assumption),
            "decision" => Ok(EpistemicStatus::Decision),
            "rejected" => Ok(EpistemicStatus::Rejected),
            "confirmed" => Ok(EpistemicStatus::Confirmed),
            "contested" => Ok(EpistemicStatus::Contested),
            other => Err(CoreError::InvalidArgument(format!("unknown epistemic status: {other}"))),
        }
    }
}

impl std::fmt::Display for EpistemicStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current status record for a `(tenant, claim_id)` pair (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpistemicStatusRecord {
    pub tenant_id: String,
    pub claim_id: String,
    pub status: EpistemicStatus,
    pub previous_status: Option<EpistemicStatus>,
    #[serde(default)]
    pub justification: HashMap<String, Value>,
    pub set_at: DateTime<Utc>,
    pub set_by: Option<String>,
}

/// A single entry in a claim's append-only transitions list (spec §3, §5
/// "the transitions list must be append-only in status-change order", §8
/// "Status monotonic history").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransition {
    pub from: Option<EpistemicStatus>,
    pub to: EpistemicStatus,
    pub at: DateTime<Utc>,
    pub set_by: Option<String>,
}
