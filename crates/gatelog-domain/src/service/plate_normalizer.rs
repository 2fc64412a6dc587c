//! Canonical form of a plate number for comparison

use std::fmt;

/// Plate number with all whitespace removed. Equality key only, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPlate(String);

impl NormalizedPlate {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedPlate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove every whitespace character. Case, punctuation and script are kept.
pub fn normalize(raw: &str) -> NormalizedPlate {
    NormalizedPlate(raw.chars().filter(|c| !c.is_whitespace()).collect())
}
