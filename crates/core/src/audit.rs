use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::normalize::round_score;
use crate::types::Severity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    Structure,
    Creative,
    Audience,
    Budget,
    Tracking,
}

impl AuditCategory {
    pub const ALL: [AuditCategory; 5] = [
        AuditCategory::Structure,
        AuditCategory::Creative,
        AuditCategory::Audience,
        AuditCategory::Budget,
        AuditCategory::Tracking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::Structure => "structure",
            AuditCategory::Creative => "creative",
            AuditCategory::Audience => "audience",
            AuditCategory::Budget => "budget",
            AuditCategory::Tracking => "tracking",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AuditIssueDefinition {
    pub code: &'static str,
    pub category: AuditCategory,
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub deduction: u32,
}

const fn issue(
    code: &'static str,
    category: AuditCategory,
    severity: Severity,
    title: &'static str,
    description: &'static str,
    deduction: u32,
) -> AuditIssueDefinition {
    AuditIssueDefinition {
        code,
        category,
        severity,
        title,
        description,
        deduction,
    }
}

use AuditCategory::{Audience, Budget, Creative, Structure, Tracking};

pub static AUDIT_ISSUES: [AuditIssueDefinition; 24] = [
    // structure
    issue(
        "POOR_NAMING",
        Structure,
        Severity::Low,
        "命名規則不一致",
        "廣告活動與廣告組合缺乏一致的命名規則，難以追蹤與比較成效",
        5,
    ),
    issue(
        "TOO_MANY_CAMPAIGNS",
        Structure,
        Severity::Medium,
        "廣告活動數量過多",
        "同時進行的廣告活動過多，預算被分散，演算法難以累積足夠數據",
        10,
    ),
    issue(
        "AD_SET_FRAGMENTATION",
        Structure,
        Severity::High,
        "廣告組合過度分散",
        "多個廣告組合預算過低，無法脫離學習階段",
        15,
    ),
    issue(
        "OBJECTIVE_MISMATCH",
        Structure,
        Severity::High,
        "廣告目標與業務目標不符",
        "廣告活動的最佳化目標與實際追蹤的轉換事件不一致",
        15,
    ),
    issue(
        "LEARNING_LIMITED",
        Structure,
        Severity::Medium,
        "學習階段受限",
        "多個廣告組合因轉換量不足而停留在學習受限狀態",
        10,
    ),
    // creative
    issue(
        "CREATIVE_FATIGUE",
        Creative,
        Severity::High,
        "素材疲勞",
        "素材頻率過高且點擊率持續下滑，受眾已對廣告產生疲乏",
        15,
    ),
    issue(
        "LOW_CREATIVE_DIVERSITY",
        Creative,
        Severity::Medium,
        "素材多樣性不足",
        "每個廣告組合的素材數量過少，缺乏格式與訊息的變化",
        10,
    ),
    issue(
        "LOW_CTR",
        Creative,
        Severity::High,
        "點擊率偏低",
        "素材點擊率明顯低於產業平均，吸引力不足",
        15,
    ),
    issue(
        "MISSING_VIDEO_CREATIVE",
        Creative,
        Severity::Low,
        "缺少影片素材",
        "帳戶中沒有影片素材，錯失影片版位的觸及機會",
        5,
    ),
    issue(
        "OUTDATED_CREATIVES",
        Creative,
        Severity::Medium,
        "素材過舊",
        "主要素材已投放超過 90 天未更新",
        10,
    ),
    // audience
    issue(
        "HIGH_AUDIENCE_OVERLAP",
        Audience,
        Severity::High,
        "受眾重疊過高",
        "多個廣告組合的受眾高度重疊，造成自我競價並推高成本",
        15,
    ),
    issue(
        "AUDIENCE_TOO_NARROW",
        Audience,
        Severity::Medium,
        "受眾範圍過窄",
        "受眾規模過小，頻率快速上升並限制投放量",
        10,
    ),
    issue(
        "AUDIENCE_TOO_BROAD",
        Audience,
        Severity::Medium,
        "受眾範圍過廣",
        "受眾缺乏有效條件，預算花費在低意圖的用戶上",
        10,
    ),
    issue(
        "NO_EXCLUSIONS",
        Audience,
        Severity::Low,
        "未設定排除受眾",
        "未排除既有顧客或已轉換用戶，造成預算浪費",
        5,
    ),
    issue(
        "NO_LOOKALIKE_AUDIENCES",
        Audience,
        Severity::Low,
        "未使用類似受眾",
        "帳戶沒有使用類似受眾來擴展高價值客群",
        5,
    ),
    // budget
    issue(
        "BUDGET_TOO_LOW",
        Budget,
        Severity::High,
        "預算不足",
        "每日預算低於取得穩定轉換所需的最低水準",
        15,
    ),
    issue(
        "UNEVEN_BUDGET_ALLOCATION",
        Budget,
        Severity::Medium,
        "預算分配不均",
        "大部分預算集中在成效較差的廣告活動",
        10,
    ),
    issue(
        "HIGH_CPA_CAMPAIGNS",
        Budget,
        Severity::High,
        "高 CPA 廣告活動",
        "部分廣告活動的 CPA 遠高於帳戶平均，持續消耗預算",
        15,
    ),
    issue(
        "LOW_ROAS_SPEND",
        Budget,
        Severity::Medium,
        "低 ROAS 花費比例過高",
        "ROAS 低於 1 的廣告活動占總花費比例過高",
        10,
    ),
    issue(
        "BUDGET_UNDERSPEND",
        Budget,
        Severity::Low,
        "預算未充分使用",
        "實際花費長期低於設定預算，投放受到限制",
        5,
    ),
    // tracking
    issue(
        "NO_CONVERSION_TRACKING",
        Tracking,
        Severity::Critical,
        "未設定轉換追蹤",
        "帳戶沒有任何轉換事件，無法衡量成效或進行轉換最佳化",
        20,
    ),
    issue(
        "PIXEL_NOT_FIRING",
        Tracking,
        Severity::Critical,
        "像素未正常觸發",
        "過去 7 天像素沒有回傳任何事件",
        20,
    ),
    issue(
        "MISSING_CAPI",
        Tracking,
        Severity::High,
        "未啟用轉換 API",
        "僅依賴瀏覽器像素，受廣告攔截與隱私限制影響而遺失事件",
        15,
    ),
    issue(
        "NO_UTM_PARAMETERS",
        Tracking,
        Severity::Low,
        "缺少 UTM 參數",
        "廣告連結沒有 UTM 參數，無法在分析工具中歸因流量",
        5,
    ),
];

static ISSUE_INDEX: Lazy<HashMap<&'static str, &'static AuditIssueDefinition>> =
    Lazy::new(|| AUDIT_ISSUES.iter().map(|i| (i.code, i)).collect());

pub fn get_audit_issue(code: &str) -> Option<&'static AuditIssueDefinition> {
    ISSUE_INDEX.get(code).copied()
}

pub fn audit_issues_by_category(category: AuditCategory) -> Vec<&'static AuditIssueDefinition> {
    AUDIT_ISSUES
        .iter()
        .filter(|i| i.category == category)
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AuditWeights {
    pub structure: f64,
    pub creative: f64,
    pub audience: f64,
    pub budget: f64,
    pub tracking: f64,
}

impl AuditWeights {
    pub fn weight(&self, category: AuditCategory) -> f64 {
        match category {
            AuditCategory::Structure => self.structure,
            AuditCategory::Creative => self.creative,
            AuditCategory::Audience => self.audience,
            AuditCategory::Budget => self.budget,
            AuditCategory::Tracking => self.tracking,
        }
    }

    pub fn total(&self) -> f64 {
        self.structure + self.creative + self.audience + self.budget + self.tracking
    }
}

pub const AUDIT_WEIGHTS: AuditWeights = AuditWeights {
    structure: 0.20,
    creative: 0.25,
    audience: 0.25,
    budget: 0.20,
    tracking: 0.10,
};

pub const DEFAULT_BASE_SCORE: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionScoreInput<'a> {
    pub base_score: u32,
    pub issues: Vec<&'a AuditIssueDefinition>,
}

impl<'a> DimensionScoreInput<'a> {
    pub fn new(issues: Vec<&'a AuditIssueDefinition>) -> Self {
        Self {
            base_score: DEFAULT_BASE_SCORE,
            issues,
        }
    }
}

impl Default for DimensionScoreInput<'_> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DimensionScoreResult {
    pub score: u8,
    pub weight: f64,
    pub issues: usize,
    pub deductions: u32,
}

pub fn calculate_dimension_score(
    input: &DimensionScoreInput<'_>,
    weight: f64,
) -> DimensionScoreResult {
    let deductions: u32 = input.issues.iter().map(|i| i.deduction).sum();
    let score = input.base_score.saturating_sub(deductions).min(100) as u8;

    DimensionScoreResult {
        score,
        weight,
        issues: input.issues.len(),
        deductions,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditDimensionInputs<'a> {
    pub structure: DimensionScoreInput<'a>,
    pub creative: DimensionScoreInput<'a>,
    pub audience: DimensionScoreInput<'a>,
    pub budget: DimensionScoreInput<'a>,
    pub tracking: DimensionScoreInput<'a>,
}

impl AuditDimensionInputs<'static> {
    /// Partitions catalog issues into dimensions. Unknown codes are returned, not scored.
    pub fn from_issue_codes<S: AsRef<str>>(codes: &[S]) -> (Self, Vec<String>) {
        let mut inputs = Self::default();
        let mut unknown = Vec::new();

        for code in codes {
            match get_audit_issue(code.as_ref()) {
                Some(def) => inputs.dimension_mut(def.category).issues.push(def),
                None => unknown.push(code.as_ref().to_string()),
            }
        }

        (inputs, unknown)
    }
}

impl<'a> AuditDimensionInputs<'a> {
    pub fn dimension(&self, category: AuditCategory) -> &DimensionScoreInput<'a> {
        match category {
            AuditCategory::Structure => &self.structure,
            AuditCategory::Creative => &self.creative,
            AuditCategory::Audience => &self.audience,
            AuditCategory::Budget => &self.budget,
            AuditCategory::Tracking => &self.tracking,
        }
    }

    pub fn dimension_mut(&mut self, category: AuditCategory) -> &mut DimensionScoreInput<'a> {
        match category {
            AuditCategory::Structure => &mut self.structure,
            AuditCategory::Creative => &mut self.creative,
            AuditCategory::Audience => &mut self.audience,
            AuditCategory::Budget => &mut self.budget,
            AuditCategory::Tracking => &mut self.tracking,
        }
    }

    pub fn all_issues(&self) -> Vec<&'a AuditIssueDefinition> {
        AuditCategory::ALL
            .iter()
            .flat_map(|c| self.dimension(*c).issues.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AuditDimensionScores {
    pub structure: DimensionScoreResult,
    pub creative: DimensionScoreResult,
    pub audience: DimensionScoreResult,
    pub budget: DimensionScoreResult,
    pub tracking: DimensionScoreResult,
}

impl AuditDimensionScores {
    pub fn get(&self, category: AuditCategory) -> &DimensionScoreResult {
        match category {
            AuditCategory::Structure => &self.structure,
            AuditCategory::Creative => &self.creative,
            AuditCategory::Audience => &self.audience,
            AuditCategory::Budget => &self.budget,
            AuditCategory::Tracking => &self.tracking,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AuditCategory, &DimensionScoreResult)> {
        AuditCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditGrade {
    Excellent,
    Good,
    NeedsImprovement,
    Critical,
}

impl AuditGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditGrade::Excellent => "excellent",
            AuditGrade::Good => "good",
            AuditGrade::NeedsImprovement => "needs_improvement",
            AuditGrade::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AuditScoreResult {
    pub dimensions: AuditDimensionScores,
    pub overall_score: u8,
    pub grade: AuditGrade,
    pub total_issues: usize,
}

pub fn calculate_audit_score(inputs: &AuditDimensionInputs<'_>) -> AuditScoreResult {
    let score =
        |c: AuditCategory| calculate_dimension_score(inputs.dimension(c), AUDIT_WEIGHTS.weight(c));

    let dimensions = AuditDimensionScores {
        structure: score(AuditCategory::Structure),
        creative: score(AuditCategory::Creative),
        audience: score(AuditCategory::Audience),
        budget: score(AuditCategory::Budget),
        tracking: score(AuditCategory::Tracking),
    };

    let weighted: f64 = dimensions
        .iter()
        .map(|(_, d)| f64::from(d.score) * d.weight)
        .sum();
    let overall_score = round_score(weighted);
    let total_issues = dimensions.iter().map(|(_, d)| d.issues).sum();

    AuditScoreResult {
        dimensions,
        overall_score,
        grade: get_audit_grade(overall_score),
        total_issues,
    }
}

/// `>= 90` excellent, `70..=89` good, `50..=69` needs improvement, below 50 critical.
pub fn get_audit_grade(score: u8) -> AuditGrade {
    match score {
        90.. => AuditGrade::Excellent,
        70..=89 => AuditGrade::Good,
        50..=69 => AuditGrade::NeedsImprovement,
        _ => AuditGrade::Critical,
    }
}

/// Most severe first, then largest deduction, then code.
pub fn prioritize_issues<'a>(
    issues: &[&'a AuditIssueDefinition],
) -> Vec<&'a AuditIssueDefinition> {
    let mut sorted = issues.to_vec();
    sorted.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.deduction.cmp(&a.deduction))
            .then_with(|| a.code.cmp(b.code))
    });
    sorted
}
