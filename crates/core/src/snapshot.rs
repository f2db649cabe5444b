use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::audit::AuditDimensionInputs;
use crate::fatigue::{fatigue_input_from_periods, CreativePeriodMetrics, FatigueInput};
use crate::period::PeriodMetrics;
use crate::types::Audience;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    BestEffort,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Strict => "STRICT",
            ParseMode::BestEffort => "BEST_EFFORT",
        }
    }
}

/// A creative either reports its changes directly or carries two periods of raw counts.
/// Explicit changes win over derived ones; a change that is neither given nor derivable is 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreativeSnapshot {
    pub id: String,
    pub name: String,
    pub frequency: f64,
    pub days_active: u32,
    #[serde(default)]
    pub ctr_change: Option<f64>,
    #[serde(default)]
    pub conversion_rate_change: Option<f64>,
    #[serde(default)]
    pub current: Option<CreativePeriodMetrics>,
    #[serde(default)]
    pub previous: Option<CreativePeriodMetrics>,
}

impl CreativeSnapshot {
    pub fn fatigue_input(&self) -> FatigueInput {
        let derived = match (&self.current, &self.previous) {
            (Some(current), Some(previous)) => Some(fatigue_input_from_periods(
                current,
                previous,
                self.frequency,
                self.days_active,
            )),
            _ => None,
        };

        FatigueInput {
            ctr_change: self
                .ctr_change
                .or(derived.map(|d| d.ctr_change))
                .unwrap_or(0.0),
            frequency: self.frequency,
            days_active: self.days_active,
            conversion_rate_change: self
                .conversion_rate_change
                .or(derived.map(|d| d.conversion_rate_change))
                .unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeriodSnapshot {
    pub current: PeriodMetrics,
    pub previous: PeriodMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSnapshot {
    pub account_name: String,
    pub account_avg_cpa: Option<f64>,
    pub creatives: Vec<CreativeSnapshot>,
    pub audiences: Vec<Audience>,
    /// Overlap counts keyed `"id1-id2"`.
    pub overlaps: HashMap<String, u64>,
    pub audit_issues: Vec<String>,
    pub periods: Option<PeriodSnapshot>,
}

impl AccountSnapshot {
    pub fn from_json_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).context("parse snapshot json")
    }

    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_slice(&bytes)
    }

    /// Scores the detected issue codes. Strict mode rejects codes missing from the catalog;
    /// best-effort mode skips them and returns them alongside the inputs.
    pub fn audit_inputs(
        &self,
        mode: ParseMode,
    ) -> anyhow::Result<(AuditDimensionInputs<'static>, Vec<String>)> {
        let (inputs, unknown) = AuditDimensionInputs::from_issue_codes(self.audit_issues.as_slice());

        if !unknown.is_empty() {
            if mode == ParseMode::Strict {
                anyhow::bail!("unknown audit issue code(s): {}", unknown.join(", "));
            }
            for code in &unknown {
                tracing::warn!(code = %code, "skipping unknown audit issue code");
            }
        }

        Ok((inputs, unknown))
    }

    /// Spend-weighted CPA across audiences with conversions.
    pub fn derived_account_avg_cpa(&self) -> Option<f64> {
        let (spend, conversions) = self
            .audiences
            .iter()
            .filter(|a| a.metrics.conversions > 0)
            .fold((0.0, 0u64), |(s, c), a| {
                (s + a.metrics.spend, c + a.metrics.conversions)
            });

        (conversions > 0).then(|| spend / conversions as f64)
    }
}
