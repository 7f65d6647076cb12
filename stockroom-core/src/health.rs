//! Stock health scoring
//!
//! Pure functions turning a product's stock counters into a 0–100 health
//! score, and mapping that score onto display classes used by the
//! dashboard.

use serde::{Deserialize, Serialize};

/// Score a product's current stock against its configured thresholds.
///
/// - 0 for nonsensical input (`max <= 0`, `min < 0`, `current < 0`)
/// - 0 when `current <= min`
/// - linear from `min` (0) to `max` (100) in between
/// - above `max`, falls back linearly and reaches 0 at `2 * max`
///
/// `current == min == max` scores 0 while `current == max + 1` with
/// `min == max` scores through the overstock branch. That jump is kept as is.
pub fn calculate_stock_score(current: i64, min: i64, max: i64) -> u8 {
    if max <= 0 || min < 0 || current < 0 {
        return 0;
    }
    if current <= min {
        return 0;
    }
    if current <= max {
        let range = max - min;
        if range == 0 {
            return 100;
        }
        let score = (current - min) as f64 / range as f64 * 100.0;
        return clamp_score(score.round());
    }

    let overstock = (current - max) as f64 / max as f64 * 100.0;
    clamp_score((100.0 - overstock).max(0.0).round())
}

fn clamp_score(score: f64) -> u8 {
    score.clamp(0.0, 100.0) as u8
}

/// Health band of a stock score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum StockHealth {
    /// score < 30
    Critical,
    /// 30 <= score < 60
    Low,
    /// 60 <= score < 90
    Good,
    /// score >= 90
    Optimal,
}

impl StockHealth {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => Self::Critical,
            30..=59 => Self::Low,
            60..=89 => Self::Good,
            _ => Self::Optimal,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Critical => "text-red-600",
            Self::Low => "text-orange-500",
            Self::Good => "text-yellow-600",
            Self::Optimal => "text-green-600",
        }
    }

    pub fn bg_color(self) -> &'static str {
        match self {
            Self::Critical => "bg-red-100",
            Self::Low => "bg-orange-100",
            Self::Good => "bg-yellow-100",
            Self::Optimal => "bg-green-100",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critique",
            Self::Low => "Faible",
            Self::Good => "Correct",
            Self::Optimal => "Optimal",
        }
    }
}

/// Text colour class for a score.
pub fn stock_score_color(score: u8) -> &'static str {
    StockHealth::from_score(score).color()
}

/// Background colour class for a score.
pub fn stock_score_bg_color(score: u8) -> &'static str {
    StockHealth::from_score(score).bg_color()
}

/// Human label for a score.
pub fn stock_score_status(score: u8) -> &'static str {
    StockHealth::from_score(score).label()
}

/// Badge variant for a score: "destructive", "outline" or "default".
pub fn stock_badge_variant(score: u8) -> &'static str {
    if score < 30 {
        "destructive"
    } else if score < 60 {
        "outline"
    } else {
        "default"
    }
}
