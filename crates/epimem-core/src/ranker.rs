//! Priority ranker (spec §4.E).
//!
//! Scores memories for a query context and selects a diversity-aware,
//! token-budgeted subset. The spec names two adjusted weights per
//! `query_type` and leaves the remaining four factors implicit; this core
//! splits the unassigned weight mass evenly across them (recorded as an
//! Open Question resolution, not a literal spec value).

use crate::domain::Claim;
use crate::provider::AiProvider;
use crate::text::{clip, has_negation, jaccard_overlap, word_set};

/// Query-type-adaptive weighting (spec §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Recent,
    Important,
    Novel,
    General,
}

/// Weights for the six scoring factors, always summing to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct PriorityWeights {
    pub relevance: f64,
    pub recency: f64,
    pub importance: f64,
    pub surprise: f64,
    pub usage: f64,
    pub context_fit: f64,
}

impl PriorityWeights {
    /// Assign `primary`/`secondary` per spec §4.E, splitting the remainder
    /// evenly across the other four factors.
    fn adapt(primary_value: f64, secondary_value: f64, primary: Factor, secondary: Factor) -> Self {
        let remainder = (1.0 - primary_value - secondary_value) / 4.0;
        let mut weights = [remainder; 6];
        weights[primary as usize] = primary_value;
        weights[secondary as usize] = secondary_value;
        Self {
            relevance: weights[Factor::Relevance as usize],
            recency: weights[Factor::Recency as usize],
            importance: weights[Factor::Importance as usize],
            surprise: weights[Factor::Surprise as usize],
            usage: weights[Factor::Usage as usize],
            context_fit: weights[Factor::ContextFit as usize],
        }
    }

    pub fn for_query_type(query_type: QueryType) -> Self {
        match query_type {
            QueryType::Recent => Self::adapt(0.40, 0.30, Factor::Recency, Factor::Relevance),
            QueryType::Important => Self::adapt(0.35, 0.25, Factor::Importance, Factor::Surprise),
            QueryType::Novel => Self::adapt(0.40, 0.30, Factor::Surprise, Factor::Relevance),
            QueryType::General => Self {
                relevance: 1.0 / 6.0,
                recency: 1.0 / 6.0,
                importance: 1.0 / 6.0,
                surprise: 1.0 / 6.0,
                usage: 1.0 / 6.0,
                context_fit: 1.0 / 6.0,
            },
        }
    }
}

#[derive(Clone, Copy)]
enum Factor {
    Relevance = 0,
    Recency = 1,
    Importance = 2,
    Surprise = 3,
    Usage = 4,
    ContextFit = 5,
}

/// An optional `[start, end]` window attached to a memory or a query
/// (spec §4.E "temporal coherence... when both items have `time_range`").
pub type TimeRange = (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>);

fn midpoint(range: TimeRange) -> chrono::DateTime<chrono::Utc> {
    range.0 + (range.1 - range.0) / 2
}

fn overlap_ratio(a: TimeRange, b: TimeRange) -> f64 {
    let start = a.0.max(b.0);
    let end = a.1.min(b.1);
    if end <= start {
        return 0.0;
    }
    let inter = (end - start).num_seconds() as f64;
    let union_start = a.0.min(b.0);
    let union_end = a.1.max(b.1);
    let union = (union_end - union_start).num_seconds().max(1) as f64;
    clip(inter / union, 0.0, 1.0)
}

fn midpoint_decay(a_mid: chrono::DateTime<chrono::Utc>, b_mid: chrono::DateTime<chrono::Utc>, half_life_days: f64) -> f64 {
    let distance_days = (a_mid - b_mid).num_seconds().abs() as f64 / 86_400.0;
    (-std::f64::consts::LN_2 * distance_days / half_life_days).exp()
}

/// Temporal coherence between a memory and the query (spec §4.E).
pub fn temporal_coherence(memory_range: Option<TimeRange>, query_range: Option<TimeRange>, half_life_days: f64) -> f64 {
    let now = chrono::Utc::now();
    match (memory_range, query_range) {
        (Some(m), Some(q)) => {
            let overlap = overlap_ratio(m, q);
            let decay = midpoint_decay(midpoint(m), midpoint(q), half_life_days);
            clip(0.2 + 0.8 * (0.75 * overlap + 0.25 * decay), 0.0, 1.0)
        }
        (Some(m), None) => midpoint_decay(midpoint(m), now, half_life_days),
        (None, Some(q)) => midpoint_decay(now, midpoint(q), half_life_days),
        (None, None) => 0.5,
    }
}

/// Epistemic coherence: agreement with accepted beliefs, penalized by
/// contradiction (spec §4.E).
pub fn epistemic_coherence(memory_claims: &[String], accepted_beliefs: &[String], provider: Option<&dyn AiProvider>) -> f64 {
    if memory_claims.is_empty() || accepted_beliefs.is_empty() {
        return 0.5;
    }
    let mut agreements = Vec::new();
    let mut penalties = Vec::new();
    for claim_text in memory_claims {
        for belief in accepted_beliefs {
            if let Some(contradicts) = provider.and_then(|p| p.detect_contradiction(claim_text, belief).ok().flatten()) {
                if contradicts {
                    penalties.push(1.0);
                } else {
                    agreements.push(1.0);
                }
            } else {
                let overlap = jaccard_overlap(&word_set(claim_text), &word_set(belief));
                let negation_differs = has_negation(claim_text) != has_negation(belief);
                if negation_differs && overlap > 0.2 {
                    penalties.push(overlap);
                } else {
                    agreements.push(overlap);
                }
            }
        }
    }
    let avg_agreement = if agreements.is_empty() { 0.0 } else { agreements.iter().sum::<f64>() / agreements.len() as f64 };
    let avg_penalty = if penalties.is_empty() { 0.0 } else { penalties.iter().sum::<f64>() / penalties.len() as f64 };
    clip(0.5 + avg_agreement - avg_penalty, 0.0, 1.0)
}

/// Inputs the ranker needs per memory, beyond the stored [`Claim`] fields.
pub struct RankingContext<'a> {
    pub query_text: &'a str,
    pub query_type: QueryType,
    pub time_range: Option<TimeRange>,
    pub half_life_days: f64,
    pub accepted_beliefs: &'a [String],
    pub provider: Option<&'a dyn AiProvider>,
}

/// Priority score for one memory against a query context (spec §4.E).
pub fn score(claim: &Claim, memory_time_range: Option<TimeRange>, ctx: &RankingContext<'_>, now: chrono::DateTime<chrono::Utc>) -> f64 {
    let weights = PriorityWeights::for_query_type(ctx.query_type);

    let text = claim.content.joined_text();
    let relevance = ctx
        .provider
        .and_then(|p| p.score_relevance(ctx.query_text, &text).ok().flatten())
        .unwrap_or_else(|| jaccard_overlap(&word_set(ctx.query_text), &word_set(&text)));

    let recency = (-std::f64::consts::LN_2 * claim.age_days(now) / ctx.half_life_days).exp();

    let usage = {
        let access = 0.6 * clip((1.0 + claim.access_count as f64).ln() / 100f64.ln(), 0.0, 1.0);
        let immediacy = 0.4 * (1.0 / (1.0 + claim.days_since_access(now)));
        access + immediacy
    };

    let temporal = temporal_coherence(memory_time_range, ctx.time_range, ctx.half_life_days);
    let epistemic = epistemic_coherence(&claim.content.claims, ctx.accepted_beliefs, ctx.provider);
    let context_fit = 0.5 * temporal + 0.5 * epistemic;

    weights.relevance * relevance
        + weights.recency * recency
        + weights.importance * claim.importance
        + weights.surprise * claim.surprise_score
        + weights.usage * usage
        + weights.context_fit * context_fit
}

/// Estimated token cost of a piece of text: `ceil(|text| / 4)` (spec §4.E).
pub fn token_estimate(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Extract a topic key for diversity tracking: the first word longer than
/// two characters that is not a negation token, else the first word
/// (spec §4.E: "first significant word or provider entity").
fn topic_key(text: &str) -> String {
    let words: Vec<String> = crate::text::words(text);
    words
        .iter()
        .find(|w| w.len() > 2 && !crate::text::NEGATION_TOKENS.contains(&w.as_str()))
        .or_else(|| words.first())
        .cloned()
        .unwrap_or_default()
}

/// One ranked candidate going into diversity-aware selection.
pub struct ScoredMemory<'a> {
    pub claim: &'a Claim,
    pub priority: f64,
    pub topic: Option<String>,
}

/// Diversity-aware, token-budgeted selection (spec §4.E).
///
/// Walks memories sorted by priority descending; the effective priority of
/// each is discounted by how many same-topic items have already been
/// admitted. Admits while `effective_priority > 0.3` and the running token
/// total stays within `budget`.
pub fn select_diverse<'a>(mut candidates: Vec<ScoredMemory<'a>>, budget: usize, diversity_factor: f64) -> Vec<&'a Claim> {
    candidates.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen_counts: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
    let mut selected = Vec::new();
    let mut tokens_used = 0usize;

    for candidate in candidates {
        let topic = candidate.topic.clone().unwrap_or_else(|| topic_key(&candidate.claim.content.joined_text()));
        let times_seen = *seen_counts.get(&topic).unwrap_or(&0) as f64;
        let effective_priority = candidate.priority * (1.0 - diversity_factor * times_seen);

        if effective_priority <= 0.3 {
            continue;
        }

        let cost = token_estimate(&candidate.claim.content.joined_text());
        if tokens_used + cost > budget {
            break;
        }

        tokens_used += cost;
        *seen_counts.entry(topic).or_insert(0) += 1;
        selected.push(candidate.claim);
    }

    selected
}
