use serde::{Deserialize, Serialize};

use crate::anomaly::Anomaly;
use crate::audience_health::AudienceHealthResult;
use crate::audit::{AuditCategory, AuditIssueDefinition, AuditScoreResult};
use crate::expansion::{format_estimated_reach, ExpansionSuggestion};
use crate::fatigue::FatigueResult;
use crate::overlap::{AudienceOverlapPair, OverlapSuggestion};
use crate::period::MetricComparison;
use crate::repair::{calculate_estimated_time, format_minutes, get_repair_steps, RepairStep};
use crate::types::{format_number, Severity};

pub const REPORT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_version: String,
    pub inputs: Inputs,
    pub audit: AuditSection,
    pub creatives: Vec<CreativeReport>,
    pub audiences: Vec<AudienceReport>,
    pub expansion_candidates: Vec<ExpansionSuggestion>,
    pub overlaps: OverlapSection,
    pub period: Option<PeriodSection>,
    pub gate: Option<GateResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inputs {
    pub input_path: String,
    pub parse_mode: String,
    pub account_name: String,
    pub account_avg_cpa: f64,
    pub currency: String,
    pub skipped_issue_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditFinding {
    pub code: String,
    pub category: AuditCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub deduction: u32,
    pub repair_steps: Vec<RepairStep>,
    pub estimated_minutes: u32,
}

impl AuditFinding {
    pub fn from_issue(issue: &AuditIssueDefinition) -> Self {
        let repair_steps = get_repair_steps(issue.code);
        Self {
            code: issue.code.to_string(),
            category: issue.category,
            severity: issue.severity,
            title: issue.title.to_string(),
            description: issue.description.to_string(),
            deduction: issue.deduction,
            estimated_minutes: calculate_estimated_time(&repair_steps),
            repair_steps,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSection {
    pub result: AuditScoreResult,
    pub findings: Vec<AuditFinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeReport {
    pub id: String,
    pub name: String,
    pub fatigue: FatigueResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudienceReport {
    pub id: String,
    pub name: String,
    pub health: AudienceHealthResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapFinding {
    pub pair: AudienceOverlapPair,
    pub suggestion: OverlapSuggestion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapSection {
    pub audience_ids: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
    /// Highest risk first.
    pub pairs: Vec<OverlapFinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSection {
    pub comparisons: Vec<MetricComparison>,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub threshold_audit_score: u8,
    pub pass: bool,
    pub reason: String,
}

pub fn evaluate_gate(overall_score: u8, threshold: u8) -> GateResult {
    let pass = overall_score >= threshold;
    GateResult {
        threshold_audit_score: threshold,
        pass,
        reason: if pass {
            "audit score meets threshold".to_string()
        } else {
            format!("audit score {overall_score} below threshold {threshold}")
        },
    }
}

impl Report {
    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        s.push_str("# adscore report\n\n");
        s.push_str(&format!("- report_version: `{}`\n", self.report_version));
        s.push_str(&format!("- account: `{}`\n", self.inputs.account_name));
        s.push_str(&format!("- input_path: `{}`\n", self.inputs.input_path));
        s.push_str(&format!("- parse_mode: `{}`\n", self.inputs.parse_mode));
        if !self.inputs.skipped_issue_codes.is_empty() {
            s.push_str(&format!(
                "- skipped_issue_codes: `{}`\n",
                self.inputs.skipped_issue_codes.join(", ")
            ));
        }
        s.push('\n');

        let audit = &self.audit.result;
        s.push_str("## Audit\n\n");
        s.push_str(&format!("- overall_score: `{}`\n", audit.overall_score));
        s.push_str(&format!("- grade: `{}`\n", audit.grade.as_str()));
        s.push_str(&format!("- total_issues: `{}`\n\n", audit.total_issues));
        s.push_str("| dimension | score | weight | issues | deductions |\n");
        s.push_str("|---|---|---|---|---|\n");
        for (category, d) in audit.dimensions.iter() {
            s.push_str(&format!(
                "| {} | {} | {:.2} | {} | {} |\n",
                category.as_str(),
                d.score,
                d.weight,
                d.issues,
                d.deductions
            ));
        }
        s.push('\n');

        s.push_str("## Findings\n\n");
        if self.audit.findings.is_empty() {
            s.push_str("- (none)\n\n");
        } else {
            for f in &self.audit.findings {
                s.push_str(&format!("### {} ({})\n", f.code, f.title));
                s.push_str(&format!("- severity: `{:?}`\n", f.severity));
                s.push_str(&format!("- deduction: `-{}`\n", f.deduction));
                s.push_str(&format!("- description: {}\n", f.description));
                s.push_str(&format!(
                    "- estimated_time: {}\n",
                    format_minutes(f.estimated_minutes)
                ));
                s.push_str("- repair_steps:\n");
                for step in &f.repair_steps {
                    s.push_str(&format!(
                        "  {}. {} ({} min)\n",
                        step.order, step.title, step.estimated_minutes
                    ));
                }
                s.push('\n');
            }
        }

        if !self.creatives.is_empty() {
            s.push_str("## Creative fatigue\n\n");
            for c in &self.creatives {
                s.push_str(&format!(
                    "- {} `{}`: `{}` ({:?})\n",
                    c.name, c.id, c.fatigue.score, c.fatigue.status
                ));
            }
            s.push('\n');
        }

        if !self.audiences.is_empty() {
            s.push_str("## Audience health\n\n");
            for a in &self.audiences {
                s.push_str(&format!(
                    "- {} `{}`: `{}` ({:?})\n",
                    a.name, a.id, a.health.score, a.health.status
                ));
            }
            s.push('\n');
        }

        if !self.expansion_candidates.is_empty() {
            s.push_str("## Expansion candidates\n\n");
            for e in &self.expansion_candidates {
                s.push_str(&format!(
                    "### {} ({:?})\n",
                    e.source_audience.name, e.priority
                ));
                s.push_str(&format!("- reason: {}\n", e.reason));
                for pct in &e.recommended_percentages {
                    if let Some(reach) = e.estimated_reach_by_percentage.get(pct) {
                        let f = format_estimated_reach(reach, &self.inputs.currency);
                        s.push_str(&format!(
                            "- {}%: {} ({}, {}, CPA {})\n",
                            pct,
                            f.estimated_size,
                            f.additional_reach,
                            f.growth_multiplier,
                            f.estimated_cpa
                        ));
                    }
                }
                if let Some(roi) = &e.roi_analysis {
                    let break_even = match roi.break_even_days {
                        Some(days) => format!("{days} days"),
                        None => "never (no current spend)".to_string(),
                    };
                    s.push_str(&format!(
                        "- roi: {} conversions, {}{} revenue, break-even {}\n",
                        format_number(roi.potential_conversions as i64),
                        self.inputs.currency,
                        format_number(roi.potential_revenue as i64),
                        break_even
                    ));
                }
                s.push('\n');
            }
        }

        let risky: Vec<&OverlapFinding> = self
            .overlaps
            .pairs
            .iter()
            .filter(|p| p.pair.overlap_percentage > 0.0)
            .collect();
        if !risky.is_empty() {
            s.push_str("## Audience overlap\n\n");
            for o in risky {
                s.push_str(&format!(
                    "- {} / {}: `{:.1}%` {:?} -> {:?}: {}\n",
                    o.pair.audience1.name,
                    o.pair.audience2.name,
                    o.pair.overlap_percentage,
                    o.pair.status,
                    o.suggestion.action,
                    o.suggestion.message
                ));
            }
            s.push('\n');
        }

        if let Some(period) = &self.period {
            s.push_str("## Period comparison\n\n");
            for m in &period.comparisons {
                s.push_str(&format!(
                    "- {}: `{}` ({:?})\n",
                    m.metric, m.comparison.display, m.comparison.color
                ));
            }
            if !period.anomalies.is_empty() {
                s.push_str("\n### Anomalies\n");
                for a in &period.anomalies {
                    s.push_str(&format!("- {}: `{:+.1}%` {:?}\n", a.metric, a.change, a.level));
                }
            }
            s.push('\n');
        }

        if let Some(g) = &self.gate {
            s.push_str("## Score gate\n\n");
            s.push_str(&format!(
                "- threshold_audit_score: `{}`\n",
                g.threshold_audit_score
            ));
            s.push_str(&format!("- pass: `{}`\n", g.pass));
            s.push_str(&format!("- reason: `{}`\n", g.reason));
            s.push('\n');
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{calculate_audit_score, get_audit_issue, AuditDimensionInputs};

    fn report_with(findings: Vec<AuditFinding>, gate: Option<GateResult>) -> Report {
        let (inputs, _) = AuditDimensionInputs::from_issue_codes(&["LOW_CTR"]);
        Report {
            report_version: REPORT_VERSION.to_string(),
            inputs: Inputs {
                input_path: "snapshot.json".to_string(),
                parse_mode: "STRICT".to_string(),
                account_name: "Demo shop".to_string(),
                account_avg_cpa: 15.0,
                currency: "$".to_string(),
                skipped_issue_codes: vec![],
            },
            audit: AuditSection {
                result: calculate_audit_score(&inputs),
                findings,
            },
            creatives: vec![],
            audiences: vec![],
            expansion_candidates: vec![],
            overlaps: OverlapSection {
                audience_ids: vec![],
                matrix: vec![],
                pairs: vec![],
            },
            period: None,
            gate,
        }
    }

    #[test]
    fn finding_carries_repair_guide() {
        let finding = AuditFinding::from_issue(get_audit_issue("LOW_CTR").unwrap());
        assert_eq!(finding.deduction, 15);
        assert_eq!(finding.repair_steps.len(), 3);
        assert_eq!(finding.estimated_minutes, 55);
    }

    #[test]
    fn markdown_includes_sections_and_findings() {
        let finding = AuditFinding::from_issue(get_audit_issue("LOW_CTR").unwrap());
        let report = report_with(vec![finding], Some(evaluate_gate(96, 97)));

        let md = report.to_markdown();
        assert!(md.contains("## Audit"));
        assert!(md.contains("| creative | 85 | 0.25 | 1 | 15 |"));
        assert!(md.contains("### LOW_CTR"));
        assert!(md.contains("## Score gate"));
        assert!(!md.contains("## Period comparison"));
    }

    #[test]
    fn markdown_without_findings() {
        let md = report_with(vec![], None).to_markdown();
        assert!(md.contains("- (none)"));
        assert!(!md.contains("## Score gate"));
    }

    #[test]
    fn gate_passes_at_threshold() {
        assert!(evaluate_gate(70, 70).pass);
        let failed = evaluate_gate(69, 70);
        assert!(!failed.pass);
        assert_eq!(failed.reason, "audit score 69 below threshold 70");
    }
}
