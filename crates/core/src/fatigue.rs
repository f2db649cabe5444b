use serde::{Deserialize, Serialize};

use crate::normalize::{change_score, days_active_score, frequency_score, round_score};
use crate::period::calculate_period_change;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FatigueInput {
    /// Signed percent change in CTR against the previous period.
    pub ctr_change: f64,
    /// Impressions per person.
    pub frequency: f64,
    pub days_active: u32,
    /// Signed percent change in conversion rate against the previous period.
    pub conversion_rate_change: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FatigueStatus {
    Healthy,
    Warning,
    Fatigued,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FatigueBreakdown {
    pub ctr_score: f64,
    pub frequency_score: f64,
    pub days_score: f64,
    pub conversion_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FatigueResult {
    pub score: u8,
    pub status: FatigueStatus,
    pub breakdown: FatigueBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueWeights {
    pub ctr: f64,
    pub frequency: f64,
    pub days: f64,
    pub conversion: f64,
}

impl FatigueWeights {
    pub fn total(&self) -> f64 {
        self.ctr + self.frequency + self.days + self.conversion
    }
}

pub const FATIGUE_WEIGHTS: FatigueWeights = FatigueWeights {
    ctr: 0.4,
    frequency: 0.3,
    days: 0.2,
    conversion: 0.1,
};

pub fn calculate_fatigue_score(input: &FatigueInput) -> FatigueResult {
    let breakdown = FatigueBreakdown {
        ctr_score: change_score(input.ctr_change),
        frequency_score: frequency_score(input.frequency),
        days_score: days_active_score(input.days_active),
        conversion_score: change_score(input.conversion_rate_change),
    };

    let w = FATIGUE_WEIGHTS;
    let score = round_score(
        breakdown.ctr_score * w.ctr
            + breakdown.frequency_score * w.frequency
            + breakdown.days_score * w.days
            + breakdown.conversion_score * w.conversion,
    );

    FatigueResult {
        score,
        status: get_fatigue_status(score),
        breakdown,
    }
}

/// `<= 40` healthy, `41..=70` warning, `> 70` fatigued.
pub fn get_fatigue_status(score: u8) -> FatigueStatus {
    match score {
        0..=40 => FatigueStatus::Healthy,
        41..=70 => FatigueStatus::Warning,
        _ => FatigueStatus::Fatigued,
    }
}

/// Raw per-period delivery counts for a single creative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CreativePeriodMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
}

impl CreativePeriodMetrics {
    pub fn ctr(&self) -> f64 {
        if self.impressions == 0 {
            0.0
        } else {
            self.clicks as f64 / self.impressions as f64 * 100.0
        }
    }

    pub fn conversion_rate(&self) -> f64 {
        if self.clicks == 0 {
            0.0
        } else {
            self.conversions as f64 / self.clicks as f64 * 100.0
        }
    }
}

/// Builds a [`FatigueInput`] from two consecutive periods of delivery counts.
pub fn fatigue_input_from_periods(
    current: &CreativePeriodMetrics,
    previous: &CreativePeriodMetrics,
    frequency: f64,
    days_active: u32,
) -> FatigueInput {
    FatigueInput {
        ctr_change: calculate_period_change(current.ctr(), previous.ctr()),
        frequency,
        days_active,
        conversion_rate_change: calculate_period_change(
            current.conversion_rate(),
            previous.conversion_rate(),
        ),
    }
}
