use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{format_number, Audience};

/// Audiences below this size are candidates for lookalike expansion.
pub const SMALL_AUDIENCE_THRESHOLD: u64 = 10_000;

/// Addressable market a lookalike percentage is taken from.
pub const MARKET_SIZE: u64 = 20_000_000;

/// Discount applied to projected conversions from a colder lookalike audience.
pub const ROI_CONSERVATIVE_FACTOR: f64 = 0.7;

/// ROAS at which the suggestion reason calls out performance explicitly.
const NOTABLE_ROAS: f64 = 3.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionPriority {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EstimatedReach {
    pub estimated_size: u64,
    pub additional_reach: i64,
    /// `f64::INFINITY` when the source audience is empty (serialized as `null`).
    pub growth_multiplier: f64,
    pub estimated_cpa: u64,
    pub market_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormattedReach {
    pub estimated_size: String,
    pub additional_reach: String,
    pub growth_multiplier: String,
    pub estimated_cpa: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoiAnalysis {
    pub potential_conversions: u64,
    pub potential_revenue: u64,
    /// `None` when the source audience has no spend to recoup the projected cost from.
    pub break_even_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpansionSuggestion {
    pub should_expand: bool,
    pub priority: ExpansionPriority,
    pub source_audience: Audience,
    pub recommended_percentages: Vec<u32>,
    pub estimated_reach_by_percentage: BTreeMap<u32, EstimatedReach>,
    pub action_steps: Vec<String>,
    pub reason: String,
    pub roi_analysis: Option<RoiAnalysis>,
}

pub fn is_small_audience(audience: &Audience) -> bool {
    audience.size < SMALL_AUDIENCE_THRESHOLD
}

fn health_score(audience: &Audience) -> u8 {
    audience.health_score.unwrap_or(0)
}

pub fn get_expansion_priority(audience: &Audience) -> ExpansionPriority {
    if audience.is_lookalike() || !is_small_audience(audience) {
        return ExpansionPriority::None;
    }

    let roas = audience.metrics.roas;
    let health = health_score(audience);
    if roas >= 5.0 && health >= 80 {
        ExpansionPriority::High
    } else if roas >= 3.0 && health >= 70 {
        ExpansionPriority::Medium
    } else {
        ExpansionPriority::Low
    }
}

/// Lookalike percentages ordered best-first.
pub fn get_suggested_similarity_percentages(audience: &Audience) -> Vec<u32> {
    if audience.is_lookalike() || !is_small_audience(audience) {
        return Vec::new();
    }

    let roas = audience.metrics.roas;
    if roas >= 5.0 {
        vec![1, 2]
    } else if roas >= 3.0 {
        vec![1, 2, 3]
    } else {
        vec![2, 3, 5]
    }
}

fn size_multiplier(percentage: u32) -> f64 {
    match percentage {
        1 => 0.01,
        2 => 0.02,
        3 => 0.03,
        5 => 0.05,
        10 => 0.10,
        other => f64::from(other) / 100.0,
    }
}

/// Wider lookalikes reach colder users, so CPA is projected to rise with the percentage.
fn cpa_factor(percentage: u32) -> f64 {
    match percentage {
        1 => 1.1,
        2 => 1.2,
        3 => 1.3,
        5 => 1.45,
        10 => 1.8,
        other => 1.0 + f64::from(other) * 0.08,
    }
}

pub fn calculate_estimated_reach(audience: &Audience, percentage: u32) -> EstimatedReach {
    let estimated_size = (MARKET_SIZE as f64 * size_multiplier(percentage)).round() as u64;
    let growth_multiplier = if audience.size == 0 {
        f64::INFINITY
    } else {
        estimated_size as f64 / audience.size as f64
    };

    EstimatedReach {
        estimated_size,
        additional_reach: estimated_size as i64 - audience.size as i64,
        growth_multiplier,
        estimated_cpa: (audience.metrics.cpa * cpa_factor(percentage)).round().max(0.0) as u64,
        market_size: MARKET_SIZE,
    }
}

fn format_multiplier(multiplier: f64) -> String {
    if multiplier.is_infinite() {
        "∞".to_string()
    } else if multiplier >= 10.0 || multiplier.fract() == 0.0 {
        format!("{}x", multiplier.round() as i64)
    } else {
        format!("{multiplier:.1}x")
    }
}

pub fn format_estimated_reach(reach: &EstimatedReach, currency: &str) -> FormattedReach {
    let sign = if reach.additional_reach >= 0 { "+" } else { "" };
    FormattedReach {
        estimated_size: format_number(reach.estimated_size as i64),
        additional_reach: format!("{sign}{}", format_number(reach.additional_reach)),
        growth_multiplier: format_multiplier(reach.growth_multiplier),
        estimated_cpa: format!("{currency}{}", format_number(reach.estimated_cpa as i64)),
    }
}

fn calculate_roi(audience: &Audience, reach: &EstimatedReach) -> RoiAnalysis {
    let metrics = &audience.metrics;
    let conversion_rate = metrics.conversions as f64 / metrics.reach.max(1) as f64;
    let potential_conversions =
        (reach.additional_reach.max(0) as f64 * conversion_rate * ROI_CONSERVATIVE_FACTOR).round();

    let avg_order_value = metrics.spend / metrics.conversions.max(1) as f64 * metrics.roas;
    let potential_revenue = (potential_conversions * avg_order_value).round();

    let estimated_spend = potential_conversions * reach.estimated_cpa as f64;
    let daily_spend = metrics.spend / 7.0;
    let break_even_days =
        (daily_spend > 0.0).then(|| (estimated_spend / daily_spend).ceil() as u32);

    RoiAnalysis {
        potential_conversions: potential_conversions as u64,
        potential_revenue: potential_revenue.max(0.0) as u64,
        break_even_days,
    }
}

fn build_action_steps(audience: &Audience, percentage: u32, reach: &EstimatedReach) -> Vec<String> {
    vec![
        format!("在受眾管理中選擇「{}」作為來源受眾", audience.name),
        format!(
            "建立 {percentage}% 類似受眾，預估規模約 {} 人",
            format_number(reach.estimated_size as i64)
        ),
        "複製目前表現最佳的廣告組合，並將受眾替換為新的類似受眾".to_string(),
        "以原預算 20% 測試 7 天，比較 CPA 與 ROAS 後再決定是否加碼".to_string(),
    ]
}

fn expansion_reason(audience: &Audience) -> String {
    let size = format_number(audience.size as i64);
    let threshold = format_number(SMALL_AUDIENCE_THRESHOLD as i64);
    if audience.metrics.roas >= NOTABLE_ROAS {
        format!(
            "受眾規模僅 {size} 人（低於 {threshold} 人），但 ROAS 高達 {:.1}，擴大觸及可望帶來更多轉換",
            audience.metrics.roas
        )
    } else {
        format!("受眾規模僅 {size} 人（低於 {threshold} 人），建立類似受眾可擴大觸及並降低頻率")
    }
}

pub fn generate_expansion_suggestion(audience: &Audience) -> ExpansionSuggestion {
    let priority = get_expansion_priority(audience);

    if priority == ExpansionPriority::None {
        let reason = if audience.is_lookalike() {
            "類似受眾不適合作為擴展來源".to_string()
        } else {
            format!(
                "受眾規模 {} 人已足夠，暫不需要擴展",
                format_number(audience.size as i64)
            )
        };
        return ExpansionSuggestion {
            should_expand: false,
            priority,
            source_audience: audience.clone(),
            recommended_percentages: Vec::new(),
            estimated_reach_by_percentage: BTreeMap::new(),
            action_steps: Vec::new(),
            reason,
            roi_analysis: None,
        };
    }

    let recommended_percentages = get_suggested_similarity_percentages(audience);
    let estimated_reach_by_percentage: BTreeMap<u32, EstimatedReach> = recommended_percentages
        .iter()
        .map(|&pct| (pct, calculate_estimated_reach(audience, pct)))
        .collect();

    let best = recommended_percentages
        .first()
        .and_then(|pct| estimated_reach_by_percentage.get(pct).map(|r| (*pct, r)));

    let action_steps = best
        .map(|(pct, reach)| build_action_steps(audience, pct, reach))
        .unwrap_or_default();

    let roi_analysis = match (priority, best) {
        (ExpansionPriority::High, Some((_, reach))) => Some(calculate_roi(audience, reach)),
        _ => None,
    };

    tracing::debug!(
        audience = %audience.id,
        ?priority,
        percentages = ?recommended_percentages,
        "expansion suggestion"
    );

    ExpansionSuggestion {
        should_expand: true,
        priority,
        source_audience: audience.clone(),
        recommended_percentages,
        estimated_reach_by_percentage,
        action_steps,
        reason: expansion_reason(audience),
        roi_analysis,
    }
}

/// Suggestions for audiences worth expanding, highest priority then highest ROAS first.
pub fn generate_expansion_suggestions(audiences: &[Audience]) -> Vec<ExpansionSuggestion> {
    let mut suggestions: Vec<ExpansionSuggestion> = audiences
        .iter()
        .map(generate_expansion_suggestion)
        .filter(|s| s.should_expand)
        .collect();

    suggestions.sort_by(|a, b| {
        b.priority.cmp(&a.priority).then_with(|| {
            b.source_audience
                .metrics
                .roas
                .total_cmp(&a.source_audience.metrics.roas)
        })
    });
    suggestions
}
