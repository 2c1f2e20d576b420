//! Quality tiers and user-selected quality modes.
//!
//! The tier is the machine-driven signal (stepped by the perf monitor with
//! hysteresis); the mode is the user's choice. A non-auto mode pins the tier,
//! `Auto` lets the monitor drive it.

use std::str::FromStr;
use thiserror::Error;

/// Discrete rendering-cost level, ordered by expense: `Performance` is the
/// cheapest to render, `Quality` the richest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityTier {
    Performance,
    Balanced,
    Quality,
}

impl QualityTier {
    /// One step toward `Performance` (saturating).
    pub fn cheaper(self) -> Self {
        match self {
            QualityTier::Quality => QualityTier::Balanced,
            _ => QualityTier::Performance,
        }
    }

    /// One step toward `Quality` (saturating).
    pub fn richer(self) -> Self {
        match self {
            QualityTier::Performance => QualityTier::Balanced,
            _ => QualityTier::Quality,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Performance => "performance",
            QualityTier::Balanced => "balanced",
            QualityTier::Quality => "quality",
        }
    }
}

/// User-facing quality selection persisted by the settings collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QualityMode {
    #[default]
    Auto,
    Quality,
    Balanced,
    Performance,
}

impl QualityMode {
    /// The tier a fixed mode pins, or `None` for `Auto`.
    pub fn fixed_tier(self) -> Option<QualityTier> {
        match self {
            QualityMode::Auto => None,
            QualityMode::Quality => Some(QualityTier::Quality),
            QualityMode::Balanced => Some(QualityTier::Balanced),
            QualityMode::Performance => Some(QualityTier::Performance),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityMode::Auto => "auto",
            QualityMode::Quality => "quality",
            QualityMode::Balanced => "balanced",
            QualityMode::Performance => "performance",
        }
    }
}

#[derive(Debug, Error)]
#[error("unrecognized quality mode `{0}`")]
pub struct ParseQualityModeError(String);

impl FromStr for QualityMode {
    type Err = ParseQualityModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(QualityMode::Auto),
            "quality" => Ok(QualityMode::Quality),
            "balanced" => Ok(QualityMode::Balanced),
            "performance" => Ok(QualityMode::Performance),
            other => Err(ParseQualityModeError(other.to_string())),
        }
    }
}
