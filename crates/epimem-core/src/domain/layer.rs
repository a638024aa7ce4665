//! Memory tier / layer (spec §3, Glossary).

use serde::{Deserialize, Serialize};

/// One of `{hot, warm, cold, frozen}` — determines retrieval cost and
/// eligibility for compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Hot,
    #[default]
    Warm,
    Cold,
    Frozen,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Hot => "hot",
            Layer::Warm => "warm",
            Layer::Cold => "cold",
            Layer::Frozen => "frozen",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hot" => Some(Layer::Hot),
            "warm" => Some(Layer::Warm),
            "cold" => Some(Layer::Cold),
            "frozen" => Some(Layer::Frozen),
            _ => None,
        }
    }

    /// Initial tier placement from a composite surprise score (spec §4.F,
    /// §8 "Tier placement"): `x >= 0.7` hot, `0.4 <= x < 0.7` warm, else cold.
    pub fn from_surprise(composite: f64) -> Self {
        if composite >= 0.7 {
            Layer::Hot
        } else if composite >= 0.4 {
            Layer::Warm
        } else {
            Layer::Cold
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_placement_thresholds() {
        assert_eq!(Layer::from_surprise(0.95), Layer::Hot);
        assert_eq!(Layer::from_surprise(0.7), Layer::Hot);
        assert_eq!(Layer::from_surprise(0.69), Layer::Warm);
        assert_eq!(Layer::from_surprise(0.4), Layer::Warm);
        assert_eq!(Layer::from_surprise(0.1), Layer::Cold);
    }

    #[test]
    fn roundtrip_through_string() {
        for layer in [Layer::Hot, Layer::Warm, Layer::Cold, Layer::Frozen] {
            assert_eq!(Layer::parse_name(layer.as_str()), Some(layer));
        }
        assert_eq!(Layer::parse_name("bogus"), None);
    }
}
