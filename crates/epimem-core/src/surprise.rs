//! Surprise metric (spec §4.B).
//!
//! Pure scoring: every signal here is a free function over plain slices so
//! the orchestrator (F) can feed it either live context fetched from the
//! store or, in tests, fixed fixtures.

use crate::domain::{Confidence, SurpriseComponents};
use crate::provider::AiProvider;
use crate::text::{clip, has_negation, jaccard_distance, jaccard_overlap, mean, shannon_entropy, variance, word_set};

/// A previously recorded claim used as context for novelty/contradiction/
/// disagreement scoring (spec §4.B: "up to 50 most recent claims for the
/// same agent").
#[derive(Debug, Clone)]
pub struct ContextClaim {
    pub text: String,
    pub confidence_mean: f64,
}

/// Everything the surprise metric needs for one claim (spec §4.B).
#[derive(Debug, Clone)]
pub struct SurpriseInputs<'a> {
    pub new_text: String,
    pub new_confidence: Confidence,
    pub previous_confidence: Option<Confidence>,
    pub evidence_quality: Vec<f64>,
    /// Existing accepted beliefs compared against for contradiction impact.
    pub beliefs: &'a [ContextClaim],
    /// Recent context claims for novelty/disagreement.
    pub context: &'a [ContextClaim],
}

/// Default weights for the four composite terms (spec §4.B).
pub struct SurpriseWeights {
    pub novelty: f64,
    pub contradiction: f64,
    pub evidence: f64,
    pub confidence_shift: f64,
}

impl Default for SurpriseWeights {
    fn default() -> Self {
        Self { novelty: 0.35, contradiction: 0.30, evidence: 0.20, confidence_shift: 0.15 }
    }
}

/// Result of a composite surprise computation.
#[derive(Debug, Clone)]
pub struct SurpriseResult {
    pub components: SurpriseComponents,
    pub composite: f64,
    /// Set when no provider was available and the lexical fallback was used
    /// for the semantic-novelty term (spec §7 `Degraded`).
    pub degraded: bool,
}

fn lexical_novelty(new_text: &str, context: &[ContextClaim]) -> f64 {
    let new_words = word_set(new_text);
    if new_words.is_empty() {
        return 0.0;
    }
    let context_words: std::collections::HashSet<String> =
        context.iter().flat_map(|c| word_set(&c.text)).collect();
    let unseen = new_words.difference(&context_words).count();
    clip(2.0 * unseen as f64 / new_words.len() as f64, 0.0, 1.0)
}

fn information_gain(new_text: &str, context: &[ContextClaim]) -> f64 {
    let new_entropy = shannon_entropy(new_text);
    let context_entropy = mean(&context.iter().map(|c| shannon_entropy(&c.text)).collect::<Vec<_>>());
    clip((new_entropy - context_entropy + 5.0) / 10.0, 0.0, 1.0)
}

fn novelty(new_text: &str, context: &[ContextClaim], provider: Option<&dyn AiProvider>) -> (f64, bool) {
    let lexical = lexical_novelty(new_text, context);
    let gain = information_gain(new_text, context);
    let context_texts: Vec<String> = context.iter().map(|c| c.text.clone()).collect();
    let (semantic, degraded) = match provider.and_then(|p| p.semantic_novelty(new_text, &context_texts).ok().flatten()) {
        Some(v) => (v, false),
        None => (lexical, true),
    };
    (0.5 * semantic + 0.3 * lexical + 0.2 * gain, degraded)
}

/// `max_over_beliefs(strength · (conf_existing + conf_new)/2)`, 0 if no
/// beliefs (spec §4.B).
fn contradiction_impact(new_text: &str, new_mean: f64, beliefs: &[ContextClaim]) -> f64 {
    beliefs
        .iter()
        .map(|belief| {
            let overlap = jaccard_overlap(&word_set(new_text), &word_set(&belief.text));
            let negation_differs = has_negation(new_text) != has_negation(&belief.text);
            let strength = if negation_differs { overlap } else { 0.0 };
            strength * (belief.confidence_mean + new_mean) / 2.0
        })
        .fold(0.0, f64::max)
}

fn evidence_accumulation(evidence_quality: &[f64]) -> f64 {
    let sum: f64 = evidence_quality.iter().sum();
    (1.0 + sum).ln() / 101f64.ln()
}

fn confidence_shift(previous: Option<Confidence>, new: Confidence) -> f64 {
    match previous {
        None => 0.0,
        Some(prev) => {
            let d_mean = (new.mean - prev.mean).abs();
            let d_range = ((new.max - new.min) - (prev.max - prev.min)).abs();
            0.7 * d_mean + 0.3 * d_range
        }
    }
}

/// `min(1, 2·(0.5·variance(confidences) + 0.5·mean_pairwise_jaccard_distance(texts)))`
/// (spec §4.B).
fn disagreement(context: &[ContextClaim]) -> f64 {
    if context.len() < 2 {
        return 0.0;
    }
    let confidences: Vec<f64> = context.iter().map(|c| c.confidence_mean).collect();
    let var = variance(&confidences);
    let mut pairwise = Vec::new();
    for i in 0..context.len() {
        for j in (i + 1)..context.len() {
            pairwise.push(jaccard_distance(&word_set(&context[i].text), &word_set(&context[j].text)));
        }
    }
    let mpjd = mean(&pairwise);
    clip(2.0 * (0.5 * var + 0.5 * mpjd), 0.0, 1.0)
}

/// Momentum placeholder until temporal history is wired (spec §4.B:
/// "momentum defaults to 0.5 until temporal history is wired").
const DEFAULT_MOMENTUM: f64 = 0.5;

/// Compute the composite surprise score and its named components
/// (spec §4.B).
pub fn compute(inputs: &SurpriseInputs<'_>, weights: &SurpriseWeights, provider: Option<&dyn AiProvider>) -> SurpriseResult {
    let (novelty_score, degraded) = novelty(&inputs.new_text, inputs.context, provider);
    let contradiction_score = contradiction_impact(&inputs.new_text, inputs.new_confidence.mean, inputs.beliefs);
    let evidence_score = evidence_accumulation(&inputs.evidence_quality);
    let confidence_shift_score = confidence_shift(inputs.previous_confidence, inputs.new_confidence);
    let disagreement_score = disagreement(inputs.context);

    // "normalize weights" (spec §4.B) renormalizes over the signals that
    // actually have data this call, rather than scoring an absent signal as
    // a flat 0: a first claim with no beliefs/evidence/prior confidence has
    // nothing to contradict or shift from, so those terms are N/A, not 0.
    // Novelty is always applicable (there is always a new text). Without
    // this, a fresh claim in an empty context is permanently capped around
    // 0.35 and can never clear the promotion/warm-tier thresholds the spec
    // §8 scenario 1 invariant requires.
    let mut total_w = weights.novelty;
    let mut weighted = weights.novelty * novelty_score;
    if !inputs.beliefs.is_empty() {
        total_w += weights.contradiction;
        weighted += weights.contradiction * contradiction_score;
    }
    if !inputs.evidence_quality.is_empty() {
        total_w += weights.evidence;
        weighted += weights.evidence * evidence_score;
    }
    if inputs.previous_confidence.is_some() {
        total_w += weights.confidence_shift;
        weighted += weights.confidence_shift * confidence_shift_score;
    }
    let weighted = weighted / total_w;

    let composite = clip(0.9 * weighted + 0.1 * DEFAULT_MOMENTUM, 0.0, 1.0);

    SurpriseResult {
        components: SurpriseComponents {
            novelty: novelty_score,
            contradiction: contradiction_score,
            evidence: evidence_score,
            confidence_shift: confidence_shift_score,
            disagreement: disagreement_score,
        },
        composite,
        degraded,
    }
}
