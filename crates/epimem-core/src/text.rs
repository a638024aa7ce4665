//! Shared lexical heuristics.
//!
//! Every component that can run without an AI provider (spec §6.2, §9 "the
//! heuristic path must remain correct in the absence of a provider") leans on
//! these small, pure helpers: tokenization, Jaccard overlap, Shannon entropy,
//! negation detection and id-slugging. Kept in one place so the fallback
//! math in B/C/D/E/J is provably the same function everywhere it's used.

use std::collections::HashSet;

/// Negation token list (spec §4.B). English-only by design (spec §9 "Open
/// Questions" — locales are a config knob for implementers, not this core).
pub const NEGATION_TOKENS: &[&str] = &["not", "no", "never", "false", "incorrect", "wrong"];

/// Lowercase, alphanumeric-only word split.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Lowercase word set (for overlap / Jaccard computations).
pub fn word_set(text: &str) -> HashSet<String> {
    words(text).into_iter().collect()
}

/// `|a ∩ b| / |a ∪ b|`, 0.0 if both are empty.
pub fn jaccard_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// `1 - jaccard_overlap(a, b)`.
pub fn jaccard_distance(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    1.0 - jaccard_overlap(a, b)
}

/// True if `text` contains any token from [`NEGATION_TOKENS`] as a whole word.
pub fn has_negation(text: &str) -> bool {
    let ws = word_set(text);
    NEGATION_TOKENS.iter().any(|t| ws.contains(*t))
}

/// Character-frequency Shannon entropy, in bits, of the lowercased text.
///
/// Empty text has zero entropy.
pub fn shannon_entropy(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let total = lower.chars().count();
    if total == 0 {
        return 0.0;
    }
    let mut counts: std::collections::HashMap<char, usize> = std::collections::HashMap::new();
    for c in lower.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

/// Mean of an f64 slice, 0.0 if empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population variance of an f64 slice, 0.0 if fewer than 2 values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    mean(&values.iter().map(|v| (v - m).powi(2)).collect::<Vec<_>>())
}

/// Deterministic entity-id slug: lowercase, `[^a-z0-9]+` collapsed to `_`,
/// leading/trailing `_` trimmed (spec §3: `{type}_{slug(name)}`).
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Clip `v` into `[lo, hi]`.
pub fn clip(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Case/whitespace-insensitive comparison key (spec §4.L `trackAccuracy`:
/// "`proven_correct = (normalize(position) == normalize(actual))`").
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_identical_sets_is_one() {
        let a = word_set("the cat sat");
        let b = word_set("the cat sat");
        assert!((jaccard_overlap(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn jaccard_disjoint_sets_is_zero() {
        let a = word_set("alpha beta");
        let b = word_set("gamma delta");
        assert_eq!(jaccard_overlap(&a, &b), 0.0);
    }

    #[test]
    fn negation_detects_whole_words_only() {
        assert!(has_negation("this is not correct"));
        assert!(!has_negation("this is notable"));
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slug("Blogging in 2026"), "blogging_in_2026");
        assert_eq!(slug("  Weird!!Name--"), "weird_name");
    }

    #[test]
    fn entropy_of_empty_is_zero() {
        assert_eq!(shannon_entropy(""), 0.0);
    }

    #[test]
    fn entropy_of_uniform_text_is_positive() {
        assert!(shannon_entropy("abcdabcd") > 0.0);
    }

    #[test]
    fn clip_bounds_values() {
        assert_eq!(clip(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clip(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clip(0.5, 0.0, 1.0), 0.5);
    }
}
