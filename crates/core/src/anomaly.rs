use serde::{Deserialize, Serialize};

use crate::period::{Direction, MetricComparison};

/// Percent change magnitude at which a metric movement becomes noteworthy.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyLevel {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anomaly {
    pub metric: String,
    pub change: f64,
    pub level: AnomalyLevel,
}

/// `|change| < threshold` is normal, below twice the threshold a warning, critical beyond.
pub fn classify_anomaly(change: f64, threshold: f64) -> AnomalyLevel {
    let magnitude = change.abs();
    if magnitude < threshold {
        AnomalyLevel::Normal
    } else if magnitude < threshold * 2.0 {
        AnomalyLevel::Warning
    } else {
        AnomalyLevel::Critical
    }
}

/// Flags unfavourable movements only, most severe first.
pub fn detect_anomalies(comparisons: &[MetricComparison], threshold: f64) -> Vec<Anomaly> {
    let mut anomalies: Vec<Anomaly> = comparisons
        .iter()
        .filter(|c| c.comparison.direction != Direction::Neutral && !c.comparison.is_improvement)
        .filter_map(|c| {
            let level = classify_anomaly(c.comparison.change, threshold);
            (level != AnomalyLevel::Normal).then(|| Anomaly {
                metric: c.metric.clone(),
                change: c.comparison.change,
                level,
            })
        })
        .collect();

    anomalies.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then_with(|| b.change.abs().total_cmp(&a.change.abs()))
            .then_with(|| a.metric.cmp(&b.metric))
    });
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_anomaly_thresholds() {
        assert_eq!(classify_anomaly(29.9, 30.0), AnomalyLevel::Normal);
        assert_eq!(classify_anomaly(-30.0, 30.0), AnomalyLevel::Warning);
        assert_eq!(classify_anomaly(59.9, 30.0), AnomalyLevel::Warning);
        assert_eq!(classify_anomaly(60.0, 30.0), AnomalyLevel::Critical);
    }

    #[test]
    fn only_unfavourable_moves_are_flagged() {
        let rows = vec![
            MetricComparison::new("conversions", 50.0, 100.0, false),
            MetricComparison::new("clicks", 200.0, 100.0, false),
            MetricComparison::new("cpa", 14.0, 10.0, true),
            MetricComparison::new("spend", 105.0, 100.0, false),
        ];

        let anomalies = detect_anomalies(&rows, DEFAULT_ANOMALY_THRESHOLD);
        let flagged: Vec<(&str, AnomalyLevel)> = anomalies
            .iter()
            .map(|a| (a.metric.as_str(), a.level))
            .collect();

        assert_eq!(
            flagged,
            [
                ("conversions", AnomalyLevel::Warning),
                ("cpa", AnomalyLevel::Warning)
            ]
        );
    }
}
