use serde::{Deserialize, Serialize};

use crate::normalize::round_half_up;

/// Largest magnitude rendered in a comparison label.
pub const MAX_DISPLAY_CHANGE: f64 = 999.9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendColor {
    Green,
    Red,
    Gray,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodComparison {
    pub change: f64,
    pub display: String,
    pub direction: Direction,
    pub color: TrendColor,
    pub is_improvement: bool,
}

/// Percent change rounded to one decimal.
///
/// Growth from a zero previous period is reported as a flat `100`, and `0 -> 0` as `0`.
pub fn calculate_period_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current == 0.0 { 0.0 } else { 100.0 };
    }
    round_half_up((current - previous) / previous * 100.0, 1)
}

/// Classifies a change for display. `inverted` marks metrics where a decrease is good (CPA).
pub fn format_period_comparison(change: f64, inverted: bool) -> PeriodComparison {
    let direction = if change > 0.0 {
        Direction::Up
    } else if change < 0.0 {
        Direction::Down
    } else {
        Direction::Neutral
    };

    let is_improvement = match direction {
        Direction::Up => !inverted,
        Direction::Down => inverted,
        Direction::Neutral => false,
    };

    let color = match direction {
        Direction::Neutral => TrendColor::Gray,
        _ if is_improvement => TrendColor::Green,
        _ => TrendColor::Red,
    };

    let magnitude = change.abs().min(MAX_DISPLAY_CHANGE);
    let sign = match direction {
        Direction::Up => "+",
        Direction::Down => "-",
        Direction::Neutral => "",
    };

    PeriodComparison {
        change,
        display: format!("{sign}{magnitude:.1}%"),
        direction,
        color,
        is_improvement,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PeriodMetrics {
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,
}

impl PeriodMetrics {
    pub fn ctr(&self) -> f64 {
        if self.impressions == 0 {
            0.0
        } else {
            self.clicks as f64 / self.impressions as f64 * 100.0
        }
    }

    pub fn cpa(&self) -> f64 {
        if self.conversions == 0 {
            0.0
        } else {
            self.spend / self.conversions as f64
        }
    }

    pub fn roas(&self) -> f64 {
        if self.spend <= 0.0 {
            0.0
        } else {
            self.revenue / self.spend
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricComparison {
    pub metric: String,
    pub current: f64,
    pub previous: f64,
    pub inverted: bool,
    pub comparison: PeriodComparison,
}

impl MetricComparison {
    pub fn new(metric: &str, current: f64, previous: f64, inverted: bool) -> Self {
        let change = calculate_period_change(current, previous);
        Self {
            metric: metric.to_string(),
            current,
            previous,
            inverted,
            comparison: format_period_comparison(change, inverted),
        }
    }
}

/// Compares the headline metrics of two periods. CPA is the only inverted metric.
pub fn compare_periods(current: &PeriodMetrics, previous: &PeriodMetrics) -> Vec<MetricComparison> {
    vec![
        MetricComparison::new("spend", current.spend, previous.spend, false),
        MetricComparison::new(
            "impressions",
            current.impressions as f64,
            previous.impressions as f64,
            false,
        ),
        MetricComparison::new("clicks", current.clicks as f64, previous.clicks as f64, false),
        MetricComparison::new("ctr", current.ctr(), previous.ctr(), false),
        MetricComparison::new(
            "conversions",
            current.conversions as f64,
            previous.conversions as f64,
            false,
        ),
        MetricComparison::new("cpa", current.cpa(), previous.cpa(), true),
        MetricComparison::new("roas", current.roas(), previous.roas(), false),
    ]
}
