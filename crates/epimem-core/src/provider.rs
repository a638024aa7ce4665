//! AI provider contract (spec §6.2, §9 "Dynamic AI adapter").
//!
//! A capability interface, not a concrete integration: every caller in
//! B/D/E/H/J takes `&dyn AiProvider` and every method has a fully-specified
//! heuristic fallback in `spec.md` itself, so [`HeuristicProvider`] is a
//! complete, correct implementation on its own (spec §9: "The heuristic path
//! must remain correct in the absence of a provider").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Confidence;
use crate::error::Result;
use crate::text;

/// Options for [`AiProvider::summarize`] (spec §6.2).
#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    pub target_compression: f64,
    pub preserve_contradictions: bool,
    pub preserve_evidence: bool,
    pub preserve_intent: bool,
}

/// An entity as extracted from free text (spec §6.2 `extractEntities`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

/// A relationship as extracted from free text (spec §6.2 `extractRelationships`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    pub from: String,
    pub from_type: String,
    pub to: String,
    pub to_type: String,
    pub relation_type: String,
    pub confidence: f64,
}

/// Wraps a value that may have come from a provider call or its heuristic
/// fallback (spec §7 `Degraded`: "the call still succeeds but the result
/// carries a `degraded=true` flag").
#[derive(Debug, Clone)]
pub struct WithDegraded<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> WithDegraded<T> {
    pub fn ok(value: T) -> Self {
        Self { value, degraded: false }
    }

    pub fn degraded(value: T) -> Self {
        Self { value, degraded: true }
    }
}

/// The external AI provider interface (spec §6.2).
///
/// Implementations must be retry-safe; the core does not retry (spec §6.2).
pub trait AiProvider: Send + Sync {
    fn summarize(&self, text: &str, opts: &SummarizeOptions) -> Result<String>;

    fn extract_entities(&self, text: &str) -> Result<Vec<ExtractedEntity>>;

    fn extract_relationships(&self, text: &str) -> Result<Vec<ExtractedRelationship>>;

    /// Batch entity extraction. Positional output (`out[i] ↔ input[i]`) is
    /// assumed (spec §9 "Open Questions": order is unspecified in source;
    /// the core assumes positional). Default: sequential fallback.
    fn extract_entities_batch(&self, texts: &[String]) -> Result<Vec<Vec<ExtractedEntity>>> {
        texts.iter().map(|t| self.extract_entities(t)).collect()
    }

    /// Batch relationship extraction, same positional-output assumption.
    fn extract_relationships_batch(&self, texts: &[String]) -> Result<Vec<Vec<ExtractedRelationship>>> {
        texts.iter().map(|t| self.extract_relationships(t)).collect()
    }

    fn extract_claims(&self, text: &str) -> Result<Vec<String>>;

    fn score_epistemic_confidence(&self, claim: &str, context: &[String]) -> Result<Confidence>;

    /// `true`, `false`, or `null` (modeled as `Option<bool>`; `None` means
    /// the provider itself is unsure, distinct from "no provider present").
    fn detect_contradiction(&self, claim_a: &str, claim_b: &str) -> Result<Option<bool>>;

    /// Semantic novelty of `new_text` against `context_texts`, in `[0,1]`.
    ///
    /// Not part of spec §6.2's enumerated required-method list — modeled
    /// here as an optional capability (default `Ok(None)`, meaning
    /// "unavailable, use the lexical fallback") rather than a required
    /// method, per spec §9's instruction to treat provider behavior as a
    /// capability interface with explicit fallback.
    fn semantic_novelty(&self, _new_text: &str, _context_texts: &[String]) -> Result<Option<f64>> {
        Ok(None)
    }

    /// Relevance of `candidate` to `query`, in `[0,1]`.
    ///
    /// Like [`AiProvider::semantic_novelty`], not part of spec §6.2's
    /// enumerated required methods — the priority ranker (E) falls back to
    /// Jaccard word overlap whenever this returns `Ok(None)` (spec §4.E:
    /// "Relevance defaults to Jaccard word overlap unless the provider
    /// supplies a scorer").
    fn score_relevance(&self, _query: &str, _candidate: &str) -> Result<Option<f64>> {
        Ok(None)
    }
}

/// Fully heuristic implementation of [`AiProvider`] — the fallback path
/// every B/D/E/H/J computation reduces to when no real provider is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicProvider;

impl AiProvider for HeuristicProvider {
    fn summarize(&self, text_in: &str, opts: &SummarizeOptions) -> Result<String> {
        let sentences: Vec<&str> = text_in
            .split(['.', '!', '?'])
            .map(|s| s.trim())
            .filter(|s| s.len() > 10)
            .collect();
        if sentences.is_empty() {
            return Ok(text_in.chars().take(200).collect());
        }
        let keep = ((sentences.len() as f64 * opts.target_compression).ceil() as usize).max(1);
        let mut chosen: Vec<&str> = sentences.iter().take(keep).copied().collect();
        if opts.preserve_contradictions {
            for s in &sentences {
                if text::has_negation(s) && !chosen.contains(s) {
                    chosen.push(s);
                }
            }
        }
        Ok(chosen.join(". "))
    }

    fn extract_entities(&self, text_in: &str) -> Result<Vec<ExtractedEntity>> {
        // Heuristic: capitalized multi-word runs are candidate entity names.
        let mut entities = Vec::new();
        for word in text_in.split_whitespace() {
            let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.len() > 2 && trimmed.chars().next().is_some_and(|c| c.is_uppercase()) {
                entities.push(ExtractedEntity {
                    name: trimmed.to_string(),
                    entity_type: "concept".to_string(),
                    attributes: HashMap::new(),
                });
            }
        }
        Ok(entities)
    }

    fn extract_relationships(&self, _text: &str) -> Result<Vec<ExtractedRelationship>> {
        // No reliable lexical fallback for relation typing; the ingestor
        // relies on the topic entity plus the claim's own `claims[]`.
        Ok(Vec::new())
    }

    fn extract_claims(&self, text_in: &str) -> Result<Vec<String>> {
        Ok(text_in
            .split(['.', '!', '?'])
            .map(|s| s.trim().to_string())
            .filter(|s| s.len() > 3)
            .collect())
    }

    fn score_epistemic_confidence(&self, claim: &str, context: &[String]) -> Result<Confidence> {
        // Heuristic: more corroborating context text sharing vocabulary
        // with the claim nudges mean confidence up.
        let claim_words = text::word_set(claim);
        let agree = context
            .iter()
            .filter(|c| text::jaccard_overlap(&claim_words, &text::word_set(c)) > 0.2)
            .count();
        let mean = text::clip(0.5 + 0.05 * agree as f64, 0.0, 1.0);
        Confidence::new((mean - 0.15).max(0.0), (mean + 0.15).min(1.0), mean)
    }

    fn detect_contradiction(&self, claim_a: &str, claim_b: &str) -> Result<Option<bool>> {
        let overlap = text::jaccard_overlap(&text::word_set(claim_a), &text::word_set(claim_b));
        let negation_differs = text::has_negation(claim_a) != text::has_negation(claim_b);
        Ok(Some(overlap > 0.2 && negation_differs))
    }
}
