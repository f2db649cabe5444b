use std::collections::HashMap;

use adscore_core::audience_health::{
    calculate_audience_health, AudienceHealthInput, AudienceHealthStatus,
};
use adscore_core::audit::{
    calculate_audit_score, calculate_dimension_score, get_audit_issue, AuditDimensionInputs,
    AuditGrade, DimensionScoreInput,
};
use adscore_core::expansion::{
    calculate_estimated_reach, format_estimated_reach, generate_expansion_suggestion,
    ExpansionPriority,
};
use adscore_core::fatigue::{calculate_fatigue_score, FatigueInput, FatigueStatus};
use adscore_core::overlap::{
    calculate_overlap_percentage, generate_overlap_matrix, get_overlap_status, AudienceBase,
    OverlapStatus,
};
use adscore_core::period::{calculate_period_change, format_period_comparison, TrendColor};
use adscore_core::repair::{
    calculate_repair_progress, format_minutes, get_repair_steps, has_repair_guide,
};
use adscore_core::types::{Audience, AudienceMetrics, AudienceType};

#[test]
fn moderately_tired_creative_is_a_warning() {
    let result = calculate_fatigue_score(&FatigueInput {
        ctr_change: -15.0,
        frequency: 3.2,
        days_active: 21,
        conversion_rate_change: -5.0,
    });
    assert_eq!(result.score, 57);
    assert_eq!(result.status, FatigueStatus::Warning);
}

#[test]
fn improving_ctr_contributes_nothing() {
    let result = calculate_fatigue_score(&FatigueInput {
        ctr_change: 40.0,
        frequency: 0.0,
        days_active: 0,
        conversion_rate_change: 10.0,
    });
    assert_eq!(result.breakdown.ctr_score, 0.0);
    assert_eq!(result.score, 0);
    assert_eq!(result.status, FatigueStatus::Healthy);
}

#[test]
fn large_efficient_audience_is_fully_healthy() {
    let result = calculate_audience_health(&AudienceHealthInput {
        size: 500_000,
        cpa: 10.0,
        account_avg_cpa: 15.0,
        roas: 4.0,
        days_since_update: 3,
    });
    assert_eq!(result.score, 100);
    assert_eq!(result.status, AudienceHealthStatus::Healthy);
}

#[test]
fn two_critical_tracking_issues_zero_out_no_dimension() {
    let issues = vec![
        get_audit_issue("NO_CONVERSION_TRACKING").unwrap(),
        get_audit_issue("PIXEL_NOT_FIRING").unwrap(),
    ];
    let tracking = calculate_dimension_score(&DimensionScoreInput::new(issues.clone()), 0.10);
    assert_eq!(tracking.score, 60);
    assert_eq!(tracking.deductions, 40);

    let inputs = AuditDimensionInputs {
        tracking: DimensionScoreInput::new(issues),
        ..AuditDimensionInputs::default()
    };
    let result = calculate_audit_score(&inputs);
    assert_eq!(result.overall_score, 96);
    assert_eq!(result.grade, AuditGrade::Excellent);
}

#[test]
fn deductions_never_go_below_zero() {
    let issues = vec![get_audit_issue("LOW_CTR").unwrap(); 10];
    let result = calculate_dimension_score(
        &DimensionScoreInput {
            base_score: 100,
            issues,
        },
        0.25,
    );
    assert_eq!(result.score, 0);
    assert_eq!(result.deductions, 150);
}

#[test]
fn overlap_against_smaller_audience() {
    assert_eq!(calculate_overlap_percentage(10_000, 4_000, 2_000), 50.0);
    assert_eq!(get_overlap_status(50.0), OverlapStatus::High);
    assert_eq!(calculate_overlap_percentage(0, 4_000, 2_000), 0.0);

    let bases = vec![
        AudienceBase {
            id: "x".to_string(),
            name: "x".to_string(),
            size: 10_000,
        },
        AudienceBase {
            id: "y".to_string(),
            name: "y".to_string(),
            size: 4_000,
        },
    ];
    let data = HashMap::from([("y-x".to_string(), 2_000)]);
    let matrix = generate_overlap_matrix(&bases, &data);
    assert_eq!(matrix, vec![vec![100.0, 50.0], vec![50.0, 100.0]]);
}

fn small_custom(roas: f64, health_score: Option<u8>) -> Audience {
    Audience {
        id: "src".to_string(),
        name: "Repeat buyers".to_string(),
        audience_type: AudienceType::Custom,
        size: 4_000,
        health_score,
        days_since_update: 2,
        metrics: AudienceMetrics {
            cpa: 20.0,
            roas,
            conversions: 50,
            reach: 3_000,
            spend: 1_000.0,
        },
    }
}

#[test]
fn strong_small_audience_gets_high_priority_expansion() {
    let suggestion = generate_expansion_suggestion(&small_custom(6.0, Some(85)));
    assert!(suggestion.should_expand);
    assert_eq!(suggestion.priority, ExpansionPriority::High);
    assert_eq!(suggestion.recommended_percentages, vec![1, 2]);
    assert_eq!(suggestion.action_steps.len(), 4);
    assert!(suggestion.roi_analysis.is_some());

    let reach = calculate_estimated_reach(&small_custom(6.0, Some(85)), 1);
    assert_eq!(reach.estimated_size, 200_000);
    assert_eq!(reach.additional_reach, 196_000);
    assert_eq!(reach.estimated_cpa, 22);
    let formatted = format_estimated_reach(&reach, "NT$");
    assert_eq!(formatted.estimated_size, "200,000");
    assert_eq!(formatted.additional_reach, "+196,000");
    assert_eq!(formatted.growth_multiplier, "50x");
    assert_eq!(formatted.estimated_cpa, "NT$22");
}

#[test]
fn unscored_audience_is_low_priority() {
    let suggestion = generate_expansion_suggestion(&small_custom(6.0, None));
    assert_eq!(suggestion.priority, ExpansionPriority::Low);
    assert!(suggestion.roi_analysis.is_none());
}

#[test]
fn repair_guides_fall_back_to_generic_steps() {
    assert!(has_repair_guide("CREATIVE_FATIGUE"));
    assert!(!has_repair_guide("SOMETHING_NEW"));

    let generic = get_repair_steps("SOMETHING_NEW");
    assert_eq!(generic.len(), 3);
    assert!(generic.iter().all(|s| s.id.starts_with("generic-")));

    let mut steps = get_repair_steps("CREATIVE_FATIGUE");
    steps[0].is_completed = true;
    assert_eq!(calculate_repair_progress(&steps), 25);
    assert_eq!(format_minutes(95), "1 小時 35 分鐘");
}

#[test]
fn period_change_handles_zero_baseline() {
    assert_eq!(calculate_period_change(0.0, 0.0), 0.0);
    assert_eq!(calculate_period_change(50.0, 0.0), 100.0);
    assert_eq!(calculate_period_change(112.5, 100.0), 12.5);

    let cpa_up = format_period_comparison(12.5, true);
    assert_eq!(cpa_up.display, "+12.5%");
    assert_eq!(cpa_up.color, TrendColor::Red);
}
