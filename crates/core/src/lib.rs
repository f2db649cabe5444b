pub mod anomaly;
pub mod audience_health;
pub mod audit;
pub mod config;
pub mod expansion;
pub mod fatigue;
pub mod normalize;
pub mod overlap;
pub mod period;
pub mod repair;
pub mod report;
pub mod snapshot;
pub mod types;

use std::path::Path;

use anyhow::Context;

use crate::{
    anomaly::{detect_anomalies, DEFAULT_ANOMALY_THRESHOLD},
    audience_health::{calculate_audience_health, AudienceHealthInput},
    audit::{calculate_audit_score, prioritize_issues},
    expansion::generate_expansion_suggestions,
    fatigue::calculate_fatigue_score,
    overlap::{
        generate_overlap_matrix, generate_overlap_pairs, get_overlap_suggestion,
        sort_overlap_pairs_by_risk, AudienceBase,
    },
    period::compare_periods,
    report::{
        evaluate_gate, AudienceReport, AuditFinding, AuditSection, CreativeReport, Inputs,
        OverlapFinding, OverlapSection, PeriodSection, Report, REPORT_VERSION,
    },
    snapshot::{AccountSnapshot, ParseMode},
    types::Audience,
};

pub const DEFAULT_CURRENCY: &str = "$";

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub strict: bool,
    pub currency: String,
    pub min_audit_score: Option<u8>,
    /// Used when the snapshot does not carry its own account-average CPA.
    pub account_avg_cpa: Option<f64>,
    pub anomaly_threshold: f64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            currency: DEFAULT_CURRENCY.to_string(),
            min_audit_score: None,
            account_avg_cpa: None,
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
        }
    }
}

pub fn analyze_file(input: &Path, opts: AnalyzeOptions) -> anyhow::Result<Report> {
    let snapshot = AccountSnapshot::load_json(input)
        .with_context(|| format!("failed to load snapshot {}", input.display()))?;

    let mut report = analyze_snapshot(&snapshot, opts)?;
    report.inputs.input_path = input.display().to_string();
    Ok(report)
}

pub fn analyze_snapshot(snapshot: &AccountSnapshot, opts: AnalyzeOptions) -> anyhow::Result<Report> {
    let parse_mode = if opts.strict {
        ParseMode::Strict
    } else {
        ParseMode::BestEffort
    };

    let (audit_inputs, skipped_issue_codes) = snapshot.audit_inputs(parse_mode)?;
    let audit_result = calculate_audit_score(&audit_inputs);
    let findings: Vec<AuditFinding> = prioritize_issues(&audit_inputs.all_issues())
        .into_iter()
        .map(AuditFinding::from_issue)
        .collect();
    tracing::debug!(
        overall_score = audit_result.overall_score,
        grade = audit_result.grade.as_str(),
        total_issues = audit_result.total_issues,
        "audit scored"
    );

    let creatives: Vec<CreativeReport> = snapshot
        .creatives
        .iter()
        .map(|c| CreativeReport {
            id: c.id.clone(),
            name: c.name.clone(),
            fatigue: calculate_fatigue_score(&c.fatigue_input()),
        })
        .collect();
    tracing::debug!(count = creatives.len(), "creatives scored");

    let account_avg_cpa = snapshot
        .account_avg_cpa
        .or(opts.account_avg_cpa)
        .or_else(|| snapshot.derived_account_avg_cpa())
        .unwrap_or(0.0);

    let mut audiences = Vec::with_capacity(snapshot.audiences.len());
    let mut scored_audiences: Vec<Audience> = Vec::with_capacity(snapshot.audiences.len());
    for audience in &snapshot.audiences {
        let health = calculate_audience_health(&AudienceHealthInput::from_audience(
            audience,
            account_avg_cpa,
        ));
        let mut scored = audience.clone();
        scored.health_score.get_or_insert(health.score);
        scored_audiences.push(scored);

        audiences.push(AudienceReport {
            id: audience.id.clone(),
            name: audience.name.clone(),
            health,
        });
    }
    let expansion_candidates = generate_expansion_suggestions(&scored_audiences);
    tracing::debug!(
        count = audiences.len(),
        account_avg_cpa,
        candidates = expansion_candidates.len(),
        "audiences scored"
    );

    let bases: Vec<AudienceBase> = snapshot.audiences.iter().map(AudienceBase::from).collect();
    let pairs = generate_overlap_pairs(&bases, &snapshot.overlaps);
    let overlaps = OverlapSection {
        audience_ids: bases.iter().map(|b| b.id.clone()).collect(),
        matrix: generate_overlap_matrix(&bases, &snapshot.overlaps),
        pairs: sort_overlap_pairs_by_risk(&pairs)
            .into_iter()
            .map(|pair| OverlapFinding {
                suggestion: get_overlap_suggestion(pair.overlap_percentage),
                pair,
            })
            .collect(),
    };

    let period = snapshot.periods.as_ref().map(|p| {
        let comparisons = compare_periods(&p.current, &p.previous);
        let anomalies = detect_anomalies(&comparisons, opts.anomaly_threshold);
        PeriodSection {
            comparisons,
            anomalies,
        }
    });

    let gate = opts
        .min_audit_score
        .map(|threshold| evaluate_gate(audit_result.overall_score, threshold));

    Ok(Report {
        report_version: REPORT_VERSION.to_string(),
        inputs: Inputs {
            input_path: String::new(),
            parse_mode: parse_mode.as_str().to_string(),
            account_name: snapshot.account_name.clone(),
            account_avg_cpa,
            currency: opts.currency,
            skipped_issue_codes,
        },
        audit: AuditSection {
            result: audit_result,
            findings,
        },
        creatives,
        audiences,
        expansion_candidates,
        overlaps,
        period,
        gate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AudienceMetrics, AudienceType};

    fn audience(id: &str, size: u64, spend: f64, conversions: u64) -> Audience {
        Audience {
            id: id.to_string(),
            name: id.to_string(),
            audience_type: AudienceType::Custom,
            size,
            health_score: None,
            days_since_update: 0,
            metrics: AudienceMetrics {
                cpa: if conversions == 0 { 0.0 } else { spend / conversions as f64 },
                roas: 2.0,
                conversions,
                reach: size,
                spend,
            },
        }
    }

    #[test]
    fn account_average_cpa_falls_back_to_options_then_audiences() {
        let snapshot = AccountSnapshot {
            audiences: vec![audience("a", 50_000, 300.0, 10), audience("b", 80_000, 100.0, 10)],
            ..AccountSnapshot::default()
        };

        let derived = analyze_snapshot(&snapshot, AnalyzeOptions::default()).unwrap();
        assert_eq!(derived.inputs.account_avg_cpa, 20.0);

        let from_opts = analyze_snapshot(
            &snapshot,
            AnalyzeOptions {
                account_avg_cpa: Some(12.0),
                ..AnalyzeOptions::default()
            },
        )
        .unwrap();
        assert_eq!(from_opts.inputs.account_avg_cpa, 12.0);
    }

    #[test]
    fn empty_snapshot_is_a_clean_report() {
        let report = analyze_snapshot(&AccountSnapshot::default(), AnalyzeOptions::default()).unwrap();
        assert_eq!(report.audit.result.overall_score, 100);
        assert!(report.audit.findings.is_empty());
        assert!(report.overlaps.matrix.is_empty());
        assert!(report.period.is_none());
        assert!(report.gate.is_none());
        assert_eq!(report.inputs.account_avg_cpa, 0.0);
    }

    #[test]
    fn computed_health_feeds_expansion_priority() {
        let mut vip = audience("vip", 2_000, 480.0, 40);
        vip.metrics.roas = 10.0;
        let snapshot = AccountSnapshot {
            account_avg_cpa: Some(15.0),
            audiences: vec![vip],
            ..AccountSnapshot::default()
        };

        let report = analyze_snapshot(&snapshot, AnalyzeOptions::default()).unwrap();
        assert_eq!(report.audiences[0].health.score, 80);
        assert_eq!(report.expansion_candidates.len(), 1);
        assert_eq!(
            report.expansion_candidates[0].source_audience.health_score,
            Some(80)
        );
    }
}
