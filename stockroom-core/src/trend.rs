//! Dashboard trend and fill-level helpers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Period-over-period change of a dashboard counter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Trend {
    pub direction: TrendDirection,
    /// Absolute change in percent, one decimal.
    pub percentage: f64,
}

impl Trend {
    pub const fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            percentage: 0.0,
        }
    }
}

/// Changes smaller than this (in percent) are reported as stable.
const STABLE_THRESHOLD: f64 = 0.5;

pub fn compute_trend(current: f64, previous: f64) -> Trend {
    if previous == 0.0 {
        if current == 0.0 {
            return Trend::stable();
        }
        return Trend {
            direction: TrendDirection::Up,
            percentage: 100.0,
        };
    }

    let change = (current - previous) / previous.abs() * 100.0;
    let percentage = (change.abs() * 10.0).round() / 10.0;
    let direction = if change.abs() < STABLE_THRESHOLD {
        TrendDirection::Stable
    } else if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    Trend {
        direction,
        percentage,
    }
}

/// Share of a technician's maximum holding currently in hand, 0–100.
pub fn calculate_inventory_percentage(quantity: i64, max: i64) -> u8 {
    if max <= 0 {
        return 0;
    }
    let percentage = (quantity as f64 / max as f64 * 100.0).round();
    percentage.clamp(0.0, 100.0) as u8
}
