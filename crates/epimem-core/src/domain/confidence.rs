//! Confidence triple (spec §3, §8 "Confidence triple validity").

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// `{min, max, mean} ∈ [0,1]³` with `min ≤ mean ≤ max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Confidence {
    /// Build and validate a confidence triple (spec §7 `InvalidArgument`:
    /// "malformed confidence triple (`min > max` or out of `[0,1]`)").
    pub fn new(min: f64, max: f64, mean: f64) -> Result<Self> {
        let triple = Self { min, max, mean };
        triple.validate()?;
        Ok(triple)
    }

    pub fn point(mean: f64) -> Result<Self> {
        Self::new(mean, mean, mean)
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.min) || !in_range(self.max) || !in_range(self.mean) {
            return Err(CoreError::InvalidArgument(format!(
                "confidence triple out of [0,1]: {self:?}"
            )));
        }
        if self.min > self.mean || self.mean > self.max {
            return Err(CoreError::InvalidArgument(format!(
                "confidence triple must satisfy min <= mean <= max: {self:?}"
            )));
        }
        Ok(())
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self { min: 0.5, max: 0.5, mean: 0.5 }
    }
}
