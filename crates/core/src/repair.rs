use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepairActionType {
    Navigate,
    Execute,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepairStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub estimated_minutes: u32,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<RepairActionType>,
}

struct StepTemplate {
    title: &'static str,
    description: &'static str,
    minutes: u32,
    action: Option<RepairActionType>,
}

const fn step(
    title: &'static str,
    description: &'static str,
    minutes: u32,
    action: Option<RepairActionType>,
) -> StepTemplate {
    StepTemplate {
        title,
        description,
        minutes,
        action,
    }
}

use RepairActionType::{Execute, External, Navigate};

const GENERIC_STEPS: [StepTemplate; 3] = [
    step("確認問題範圍", "檢視受影響的廣告活動與廣告組合，記錄目前的設定與成效", 10, Some(Navigate)),
    step("調整設定", "依據問題說明修正相關設定，一次只調整一個變數", 15, Some(Execute)),
    step("觀察成效", "調整後觀察 3 到 7 天的成效變化，確認問題已改善", 5, None),
];

static REPAIR_GUIDES: Lazy<HashMap<&'static str, Vec<StepTemplate>>> = Lazy::new(|| {
    HashMap::from([
        (
            "POOR_NAMING",
            vec![
                step("制定命名規則", "訂出包含目標、受眾、素材與日期的命名格式", 10, None),
                step("重新命名廣告活動", "依命名規則批次修改現有廣告活動與廣告組合名稱", 20, Some(Navigate)),
                step("分享命名文件", "將命名規則寫入團隊文件，確保新建項目一致", 5, Some(External)),
            ],
        ),
        (
            "TOO_MANY_CAMPAIGNS",
            vec![
                step("列出活動清單", "匯出所有進行中的廣告活動及其目標與花費", 10, Some(Navigate)),
                step("找出重複目標", "標記目標與受眾相同的廣告活動", 15, None),
                step("合併廣告活動", "將重複的廣告活動合併，保留成效最佳的設定", 30, Some(Execute)),
                step("暫停低效活動", "暫停過去 14 天沒有轉換的廣告活動", 10, Some(Execute)),
            ],
        ),
        (
            "AD_SET_FRAGMENTATION",
            vec![
                step("檢視廣告組合預算", "找出每日預算不足以取得每週 50 次轉換的廣告組合", 15, Some(Navigate)),
                step("合併相似廣告組合", "將受眾相近的廣告組合合併為一個", 30, Some(Execute)),
                step("啟用活動預算最佳化", "改用廣告活動層級預算，讓系統自動分配", 10, Some(Execute)),
            ],
        ),
        (
            "CREATIVE_FATIGUE",
            vec![
                step("找出疲勞素材", "篩選頻率高於 3 且點擊率持續下滑的素材", 10, Some(Navigate)),
                step("準備新素材", "製作 2 到 3 組不同角度的新素材", 60, Some(External)),
                step("替換素材", "暫停疲勞素材並上架新素材", 15, Some(Execute)),
                step("追蹤新素材成效", "一週後比較新舊素材的點擊率與 CPA", 10, None),
            ],
        ),
        (
            "LOW_CREATIVE_DIVERSITY",
            vec![
                step("盤點素材格式", "統計每個廣告組合中的圖片、影片與輪播素材數量", 10, Some(Navigate)),
                step("補齊素材格式", "為每個廣告組合至少提供 3 種不同格式的素材", 45, Some(External)),
                step("啟用動態素材", "開啟動態素材組合，讓系統測試最佳組合", 10, Some(Execute)),
            ],
        ),
        (
            "LOW_CTR",
            vec![
                step("分析低點擊素材", "找出點擊率低於帳戶平均一半的素材", 10, Some(Navigate)),
                step("改寫文案與標題", "強化開頭訊息與行動呼籲", 30, Some(External)),
                step("進行 A/B 測試", "建立新舊版本的對照測試", 15, Some(Execute)),
            ],
        ),
        (
            "HIGH_AUDIENCE_OVERLAP",
            vec![
                step("檢視受眾重疊", "在受眾重疊分析中找出重疊率超過 30% 的組合", 10, Some(Navigate)),
                step("設定排除受眾", "在較小的廣告組合中排除另一個受眾", 15, Some(Execute)),
                step("合併高度重疊受眾", "重疊率超過 70% 時合併受眾並集中預算", 20, Some(Execute)),
            ],
        ),
        (
            "AUDIENCE_TOO_NARROW",
            vec![
                step("檢查受眾條件", "列出造成受眾過小的興趣與地區限制", 10, Some(Navigate)),
                step("放寬條件或擴展", "移除過度限制的條件，或建立 1% 到 3% 類似受眾", 20, Some(Execute)),
                step("監控頻率", "確認新受眾的頻率維持在 3 以下", 5, None),
            ],
        ),
        (
            "NO_EXCLUSIONS",
            vec![
                step("建立既有顧客受眾", "以購買事件或顧客名單建立自訂受眾", 15, Some(Navigate)),
                step("套用排除受眾", "在開發新客的廣告組合中排除既有顧客", 10, Some(Execute)),
                step("確認排除生效", "檢查預估受眾規模是否已更新", 5, None),
            ],
        ),
        (
            "BUDGET_TOO_LOW",
            vec![
                step("計算所需預算", "以目標 CPA 乘上每週 50 次轉換估算最低預算", 10, None),
                step("重新分配預算", "將低效廣告活動的預算移轉到主要活動", 15, Some(Execute)),
                step("逐步提高預算", "每 3 天調升不超過 20%，避免重新進入學習階段", 5, Some(Execute)),
            ],
        ),
        (
            "HIGH_CPA_CAMPAIGNS",
            vec![
                step("找出高 CPA 活動", "篩選 CPA 超過帳戶平均 1.3 倍的廣告活動", 10, Some(Navigate)),
                step("診斷原因", "檢查受眾、素材與到達頁的轉換漏斗", 20, None),
                step("降低預算或暫停", "降低高 CPA 活動的預算，必要時暫停", 10, Some(Execute)),
            ],
        ),
        (
            "NO_CONVERSION_TRACKING",
            vec![
                step("安裝像素", "在網站所有頁面安裝廣告像素基本程式碼", 30, Some(External)),
                step("設定轉換事件", "為購買、加入購物車與註冊設定標準事件", 30, Some(External)),
                step("驗證事件", "使用事件測試工具確認事件正確回傳", 15, Some(Navigate)),
                step("設定最佳化目標", "將廣告活動的最佳化目標改為轉換事件", 10, Some(Execute)),
            ],
        ),
        (
            "PIXEL_NOT_FIRING",
            vec![
                step("檢查像素狀態", "在事件管理工具確認最後一次接收事件的時間", 5, Some(Navigate)),
                step("檢查網站程式碼", "確認像素程式碼未被移除或被標籤管理工具阻擋", 20, Some(External)),
                step("重新驗證事件", "以測試事件工具觸發並確認事件回傳", 10, Some(Navigate)),
            ],
        ),
        (
            "MISSING_CAPI",
            vec![
                step("選擇串接方式", "評估使用合作夥伴整合或自行串接轉換 API", 15, None),
                step("設定轉換 API", "依照文件完成伺服器端事件傳送", 60, Some(External)),
                step("設定事件去重", "為瀏覽器與伺服器事件設定相同的事件 ID", 20, Some(External)),
                step("檢查事件配對品質", "確認事件配對品質分數達到良好以上", 10, Some(Navigate)),
            ],
        ),
    ])
});

fn instantiate(prefix: &str, templates: &[StepTemplate]) -> Vec<RepairStep> {
    templates
        .iter()
        .zip(1u32..)
        .map(|(t, order)| RepairStep {
            id: format!("{prefix}-{order}"),
            title: t.title.to_string(),
            description: t.description.to_string(),
            order,
            estimated_minutes: t.minutes,
            is_completed: false,
            action_type: t.action,
        })
        .collect()
}

pub fn has_repair_guide(issue_code: &str) -> bool {
    REPAIR_GUIDES.contains_key(issue_code)
}

/// Ordered steps for an issue. Unknown codes receive the generic three-step guide.
pub fn get_repair_steps(issue_code: &str) -> Vec<RepairStep> {
    match REPAIR_GUIDES.get(issue_code) {
        Some(templates) => instantiate(&issue_code.to_lowercase(), templates),
        None => instantiate("generic", &GENERIC_STEPS),
    }
}

/// Percentage of completed steps, 0 when there are no steps.
pub fn calculate_repair_progress(steps: &[RepairStep]) -> u8 {
    if steps.is_empty() {
        return 0;
    }
    let completed = steps.iter().filter(|s| s.is_completed).count();
    (completed as f64 / steps.len() as f64 * 100.0).round() as u8
}

/// An empty guide is never complete.
pub fn are_all_steps_complete(steps: &[RepairStep]) -> bool {
    !steps.is_empty() && steps.iter().all(|s| s.is_completed)
}

pub fn calculate_estimated_time(steps: &[RepairStep]) -> u32 {
    steps.iter().map(|s| s.estimated_minutes).sum()
}

pub fn calculate_remaining_time(steps: &[RepairStep]) -> u32 {
    steps
        .iter()
        .filter(|s| !s.is_completed)
        .map(|s| s.estimated_minutes)
        .sum()
}

/// Renders minutes as `45 分鐘`, `2 小時` or `1 小時 30 分鐘`.
pub fn format_minutes(minutes: u32) -> String {
    let (hours, rest) = (minutes / 60, minutes % 60);
    match (hours, rest) {
        (0, m) => format!("{m} 分鐘"),
        (h, 0) => format!("{h} 小時"),
        (h, m) => format!("{h} 小時 {m} 分鐘"),
    }
}
