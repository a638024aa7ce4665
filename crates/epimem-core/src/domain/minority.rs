//! Minority opinion (spec §3, Glossary).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded dissent, with optional ground-truth verification (spec §3
/// "Minority opinion").
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinorityOpinion {
    pub id: String,
    pub tenant_id: String,
    pub session_id: String,
    pub agent_id: String,
    pub position: String,
    pub reasoning: String,
    pub confidence: f64,
    pub majority_position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proven_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl MinorityOpinion {
    pub fn new_id() -> String {
        format!("minority_{}", uuid::Uuid::new_v4())
    }
}

/// Per-agent accuracy aggregate (spec §4.L `trackAccuracy`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MinorityAccuracy {
    pub agent_id: String,
    pub total_opinions: u64,
    pub correct_count: u64,
    pub accuracy: f64,
}

impl MinorityAccuracy {
    /// `reliability = accuracy * ln(1 + total_opinions)` (spec §4.L).
    pub fn reliability(&self) -> f64 {
        self.accuracy * (1.0 + self.total_opinions as f64).ln()
    }

    pub fn recompute_accuracy(&mut self) {
        self.accuracy = if self.total_opinions == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.total_opinions as f64
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliability_matches_spec_scenario() {
        // spec §8 scenario 6: 5 opinions, 4 correct -> accuracy 0.8,
        // reliability = 0.8 * ln(6) ~= 1.43
        let mut acc = MinorityAccuracy {
            agent_id: "bob".into(),
            total_opinions: 5,
            correct_count: 4,
            accuracy: 0.0,
        };
        acc.recompute_accuracy();
        assert!((acc.accuracy - 0.8).abs() < 1e-9);
        assert!((acc.reliability() - 1.43).abs() < 0.01);
    }
}
