use serde::{Deserialize, Serialize};

use crate::normalize::{cpa_score, freshness_score, roas_score, round_score, size_score};
use crate::types::Audience;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudienceHealthInput {
    pub size: u64,
    pub cpa: f64,
    pub account_avg_cpa: f64,
    pub roas: f64,
    pub days_since_update: u32,
}

impl AudienceHealthInput {
    pub fn from_audience(audience: &Audience, account_avg_cpa: f64) -> Self {
        Self {
            size: audience.size,
            cpa: audience.metrics.cpa,
            account_avg_cpa,
            roas: audience.metrics.roas,
            days_since_update: audience.days_since_update,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudienceHealthStatus {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudienceHealthBreakdown {
    pub size_score: f64,
    pub cpa_score: f64,
    pub roas_score: f64,
    pub freshness_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudienceHealthResult {
    pub score: u8,
    pub status: AudienceHealthStatus,
    pub breakdown: AudienceHealthBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudienceHealthWeights {
    pub size: f64,
    pub cpa: f64,
    pub roas: f64,
    pub freshness: f64,
}

impl AudienceHealthWeights {
    pub fn total(&self) -> f64 {
        self.size + self.cpa + self.roas + self.freshness
    }
}

pub const AUDIENCE_HEALTH_WEIGHTS: AudienceHealthWeights = AudienceHealthWeights {
    size: 0.25,
    cpa: 0.35,
    roas: 0.25,
    freshness: 0.15,
};

pub fn calculate_audience_health(input: &AudienceHealthInput) -> AudienceHealthResult {
    let breakdown = AudienceHealthBreakdown {
        size_score: size_score(input.size),
        cpa_score: cpa_score(input.cpa, input.account_avg_cpa),
        roas_score: roas_score(input.roas),
        freshness_score: freshness_score(input.days_since_update),
    };

    let w = AUDIENCE_HEALTH_WEIGHTS;
    let score = round_score(
        breakdown.size_score * w.size
            + breakdown.cpa_score * w.cpa
            + breakdown.roas_score * w.roas
            + breakdown.freshness_score * w.freshness,
    );

    AudienceHealthResult {
        score,
        status: get_audience_health_status(score),
        breakdown,
    }
}

/// `>= 70` healthy, `40..70` warning, below 40 critical.
pub fn get_audience_health_status(score: u8) -> AudienceHealthStatus {
    if score >= 70 {
        AudienceHealthStatus::Healthy
    } else if score >= 40 {
        AudienceHealthStatus::Warning
    } else {
        AudienceHealthStatus::Critical
    }
}
