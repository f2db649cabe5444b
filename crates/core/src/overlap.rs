use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::round_half_up;
use crate::types::Audience;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudienceBase {
    pub id: String,
    pub name: String,
    pub size: u64,
}

impl From<&Audience> for AudienceBase {
    fn from(audience: &Audience) -> Self {
        Self {
            id: audience.id.clone(),
            name: audience.name.clone(),
            size: audience.size,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverlapStatus {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudienceOverlapPair {
    pub audience1: AudienceBase,
    pub audience2: AudienceBase,
    pub overlap_count: u64,
    pub overlap_percentage: f64,
    pub status: OverlapStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverlapAction {
    None,
    Monitor,
    Exclude,
    Merge,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlapSuggestion {
    pub action: OverlapAction,
    pub priority: OverlapPriority,
    pub message: String,
}

/// Share of the smaller audience present in the other, capped at 100 and rounded to one decimal.
/// Relative to the smaller audience, so `(a, b)` and `(b, a)` give the same figure.
pub fn calculate_overlap_percentage(size_a: u64, size_b: u64, overlap_count: u64) -> f64 {
    let smaller = size_a.min(size_b);
    if smaller == 0 {
        return 0.0;
    }
    let pct = (overlap_count as f64 / smaller as f64 * 100.0).min(100.0);
    round_half_up(pct, 1)
}

/// `< 20` low, `20..30` moderate, `>= 30` high.
pub fn get_overlap_status(percentage: f64) -> OverlapStatus {
    if percentage < 20.0 {
        OverlapStatus::Low
    } else if percentage < 30.0 {
        OverlapStatus::Moderate
    } else {
        OverlapStatus::High
    }
}

/// Overlap counts are keyed `"id1-id2"`; either orientation is accepted and absent keys are 0.
pub fn lookup_overlap_count(overlap_data: &HashMap<String, u64>, id_a: &str, id_b: &str) -> u64 {
    overlap_data
        .get(&format!("{id_a}-{id_b}"))
        .or_else(|| overlap_data.get(&format!("{id_b}-{id_a}")))
        .copied()
        .unwrap_or(0)
}

/// N x N percentages in input order with a fixed 100 on the diagonal.
pub fn generate_overlap_matrix(
    audiences: &[AudienceBase],
    overlap_data: &HashMap<String, u64>,
) -> Vec<Vec<f64>> {
    audiences
        .iter()
        .enumerate()
        .map(|(i, a)| {
            audiences
                .iter()
                .enumerate()
                .map(|(j, b)| {
                    if i == j {
                        100.0
                    } else {
                        let count = lookup_overlap_count(overlap_data, &a.id, &b.id);
                        calculate_overlap_percentage(a.size, b.size, count)
                    }
                })
                .collect()
        })
        .collect()
}

/// One entry per unordered pair, in input order.
pub fn generate_overlap_pairs(
    audiences: &[AudienceBase],
    overlap_data: &HashMap<String, u64>,
) -> Vec<AudienceOverlapPair> {
    let mut pairs = Vec::new();
    for (i, a) in audiences.iter().enumerate() {
        for b in &audiences[i + 1..] {
            let overlap_count = lookup_overlap_count(overlap_data, &a.id, &b.id);
            let overlap_percentage = calculate_overlap_percentage(a.size, b.size, overlap_count);
            pairs.push(AudienceOverlapPair {
                audience1: a.clone(),
                audience2: b.clone(),
                overlap_count,
                overlap_percentage,
                status: get_overlap_status(overlap_percentage),
            });
        }
    }
    pairs
}

pub fn get_overlap_suggestion(percentage: f64) -> OverlapSuggestion {
    let (action, priority, message) = if percentage < 20.0 {
        (
            OverlapAction::None,
            OverlapPriority::Low,
            format!("重疊率 {percentage:.1}% 屬正常範圍，無需調整"),
        )
    } else if percentage < 30.0 {
        (
            OverlapAction::Monitor,
            OverlapPriority::Medium,
            format!("重疊率 {percentage:.1}%，建議持續監控兩個受眾的頻率與成本變化"),
        )
    } else if percentage < 70.0 {
        (
            OverlapAction::Exclude,
            OverlapPriority::High,
            format!("重疊率 {percentage:.1}%，建議在其中一個廣告組合排除另一個受眾，避免自我競價"),
        )
    } else {
        (
            OverlapAction::Merge,
            OverlapPriority::Critical,
            format!("重疊率 {percentage:.1}% 過高，建議合併兩個受眾並集中預算"),
        )
    };

    OverlapSuggestion {
        action,
        priority,
        message,
    }
}

/// Highest overlap first. The input slice is left untouched.
pub fn sort_overlap_pairs_by_risk(pairs: &[AudienceOverlapPair]) -> Vec<AudienceOverlapPair> {
    let mut sorted = pairs.to_vec();
    sorted.sort_by(|a, b| b.overlap_percentage.total_cmp(&a.overlap_percentage));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(id: &str, size: u64) -> AudienceBase {
        AudienceBase {
            id: id.to_string(),
            name: format!("audience {id}"),
            size,
        }
    }

    #[test]
    fn percentage_uses_smaller_audience() {
        assert_eq!(calculate_overlap_percentage(1000, 500, 250), 50.0);
        assert_eq!(calculate_overlap_percentage(500, 1000, 250), 50.0);
        assert_eq!(calculate_overlap_percentage(3000, 3000, 1000), 33.3);
    }

    #[test]
    fn percentage_is_capped_and_zero_safe() {
        assert_eq!(calculate_overlap_percentage(100, 200, 500), 100.0);
        assert_eq!(calculate_overlap_percentage(0, 200, 50), 0.0);
        assert_eq!(calculate_overlap_percentage(0, 0, 0), 0.0);
    }

    #[test]
    fn status_boundaries() {
        assert_eq!(get_overlap_status(19.9), OverlapStatus::Low);
        assert_eq!(get_overlap_status(20.0), OverlapStatus::Moderate);
        assert_eq!(get_overlap_status(29.9), OverlapStatus::Moderate);
        assert_eq!(get_overlap_status(30.0), OverlapStatus::High);
        assert_eq!(get_overlap_status(50.0), OverlapStatus::High);
    }

    #[test]
    fn suggestion_vocabulary() {
        let none = get_overlap_suggestion(10.0);
        assert_eq!(none.action, OverlapAction::None);
        assert_eq!(none.priority, OverlapPriority::Low);

        let monitor = get_overlap_suggestion(25.0);
        assert_eq!(monitor.action, OverlapAction::Monitor);
        assert_eq!(monitor.priority, OverlapPriority::Medium);
        assert!(monitor.message.contains("監控"));

        let exclude = get_overlap_suggestion(30.0);
        assert_eq!(exclude.action, OverlapAction::Exclude);
        assert_eq!(exclude.priority, OverlapPriority::High);
        assert!(exclude.message.contains("排除"));

        let merge = get_overlap_suggestion(70.0);
        assert_eq!(merge.action, OverlapAction::Merge);
        assert_eq!(merge.priority, OverlapPriority::Critical);
        assert!(merge.message.contains("合併"));
    }

    #[test]
    fn matrix_has_fixed_diagonal_and_symmetric_cells() {
        let audiences = vec![base("a", 1000), base("b", 500), base("c", 2000)];
        let data = HashMap::from([("a-b".to_string(), 250), ("c-a".to_string(), 100)]);

        let matrix = generate_overlap_matrix(&audiences, &data);
        assert_eq!(matrix.len(), 3);
        for (i, row) in matrix.iter().enumerate() {
            assert_eq!(row.len(), 3);
            assert_eq!(row[i], 100.0);
        }
        assert_eq!(matrix[0][1], 50.0);
        assert_eq!(matrix[1][0], 50.0);
        assert_eq!(matrix[0][2], 10.0);
        assert_eq!(matrix[2][0], 10.0);
        assert_eq!(matrix[1][2], 0.0);
    }

    #[test]
    fn pairs_cover_each_unordered_pair_once() {
        let audiences = vec![base("a", 1000), base("b", 500), base("c", 2000)];
        let data = HashMap::from([("a-b".to_string(), 250)]);

        let pairs = generate_overlap_pairs(&audiences, &data);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].audience1.id, "a");
        assert_eq!(pairs[0].audience2.id, "b");
        assert_eq!(pairs[0].status, OverlapStatus::High);
        assert_eq!(pairs[1].overlap_count, 0);
        assert_eq!(pairs[1].status, OverlapStatus::Low);
    }

    #[test]
    fn sort_by_risk_leaves_input_untouched() {
        let audiences = vec![base("a", 1000), base("b", 500), base("c", 100)];
        let data = HashMap::from([
            ("a-b".to_string(), 100),
            ("a-c".to_string(), 90),
            ("b-c".to_string(), 25),
        ]);
        let pairs = generate_overlap_pairs(&audiences, &data);
        let before = pairs.clone();

        let sorted = sort_overlap_pairs_by_risk(&pairs);
        let pcts: Vec<f64> = sorted.iter().map(|p| p.overlap_percentage).collect();
        assert_eq!(pcts, [90.0, 25.0, 20.0]);
        assert_eq!(pairs, before);
    }
}
