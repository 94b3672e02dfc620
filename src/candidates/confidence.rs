// src/candidates/confidence.rs
//! Confidence tiers for extracted fields.
//!
//! Every place that renders a confidence value goes through [`classify`], so
//! the thresholds live here and nowhere else.

use std::fmt;

/// Visual weight of a status or confidence badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeVariant {
    Default,
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceTier {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::None => "none",
            ConfidenceTier::Low => "low",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::High => "high",
            ConfidenceTier::VeryHigh => "very-high",
        }
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            ConfidenceTier::None => BadgeVariant::Default,
            ConfidenceTier::Low => BadgeVariant::Error,
            ConfidenceTier::Medium => BadgeVariant::Warning,
            ConfidenceTier::High => BadgeVariant::Info,
            ConfidenceTier::VeryHigh => BadgeVariant::Success,
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounded percentage of a confidence score.
pub fn percentage(confidence: f64) -> i64 {
    (confidence * 100.0).round() as i64
}

/// Maps a confidence score to its display tier.
///
/// Thresholds apply to the rounded percentage: 90 and above is very high,
/// 70 to 89 high, 50 to 69 medium, anything lower (including NaN) low.
/// An absent score is `None`.
pub fn classify(confidence: Option<f64>) -> ConfidenceTier {
    let Some(confidence) = confidence else {
        return ConfidenceTier::None;
    };

    match percentage(confidence) {
        p if p >= 90 => ConfidenceTier::VeryHigh,
        p if p >= 70 => ConfidenceTier::High,
        p if p >= 50 => ConfidenceTier::Medium,
        _ => ConfidenceTier::Low,
    }
}

/// Badge text for a confidence score, e.g. `95% confidence` or `N/A`.
pub fn confidence_label(confidence: Option<f64>) -> String {
    match confidence {
        Some(c) => format!("{}% confidence", percentage(c)),
        None => "N/A".to_string(),
    }
}
