/// Returned when a sub-score cannot be computed, e.g. a non-positive account average CPA.
pub const NEUTRAL_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
    pub out_low: f64,
    pub out_high: f64,
}

impl Band {
    pub const fn new(lower: f64, upper: f64, out_low: f64, out_high: f64) -> Self {
        Self {
            lower,
            upper,
            out_low,
            out_high,
        }
    }
}

/// Signed percent change (CTR or conversion rate) negated, so a larger drop reads further right.
pub const CHANGE_BANDS: [Band; 3] = [
    Band::new(0.0, 10.0, 25.0, 50.0),
    Band::new(10.0, 20.0, 50.0, 75.0),
    Band::new(20.0, 30.0, 75.0, 100.0),
];

pub const FREQUENCY_BANDS: [Band; 4] = [
    Band::new(0.0, 2.0, 0.0, 25.0),
    Band::new(2.0, 3.0, 25.0, 50.0),
    Band::new(3.0, 4.0, 50.0, 75.0),
    Band::new(4.0, 6.0, 75.0, 100.0),
];

pub const DAYS_ACTIVE_BANDS: [Band; 4] = [
    Band::new(0.0, 7.0, 0.0, 25.0),
    Band::new(7.0, 14.0, 25.0, 50.0),
    Band::new(14.0, 30.0, 50.0, 75.0),
    Band::new(30.0, 60.0, 75.0, 100.0),
];

pub const SIZE_BANDS: [Band; 5] = [
    Band::new(0.0, 5_000.0, 0.0, 50.0),
    Band::new(5_000.0, 10_000.0, 50.0, 100.0),
    Band::new(10_000.0, 2_000_000.0, 100.0, 100.0),
    Band::new(2_000_000.0, 6_000_000.0, 100.0, 50.0),
    Band::new(6_000_000.0, 10_000_000.0, 50.0, 0.0),
];

/// Keyed on `cpa / account_avg_cpa`.
pub const CPA_RATIO_BANDS: [Band; 2] = [
    Band::new(1.0, 1.3, 100.0, 50.0),
    Band::new(1.3, 2.0, 50.0, 0.0),
];

pub const ROAS_BANDS: [Band; 2] = [
    Band::new(0.0, 1.0, 0.0, 50.0),
    Band::new(1.0, 1.5, 50.0, 100.0),
];

pub const FRESHNESS_BANDS: [Band; 2] = [
    Band::new(30.0, 60.0, 100.0, 50.0),
    Band::new(60.0, 90.0, 50.0, 0.0),
];

/// Linear interpolation of `x` across `band`, clamped to the band's output range.
pub fn lerp(x: f64, band: &Band) -> f64 {
    let span = band.upper - band.lower;
    if span <= 0.0 {
        return band.out_high;
    }
    let t = ((x - band.lower) / span).clamp(0.0, 1.0);
    band.out_low + (band.out_high - band.out_low) * t
}

/// Maps `value` through a band table onto `[0, 100]`. Values below the first band take its low
/// output and values above the last band take its high output.
pub fn normalize(value: f64, bands: &[Band]) -> f64 {
    let (first, last) = match (bands.first(), bands.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return NEUTRAL_SCORE,
    };

    let raw = if value <= first.lower {
        first.out_low
    } else if value >= last.upper {
        last.out_high
    } else {
        bands
            .iter()
            .find(|b| value < b.upper)
            .map(|b| lerp(value, b))
            .unwrap_or(last.out_high)
    };

    raw.clamp(0.0, 100.0)
}

/// Higher means more fatigued. Any improvement scores 0; a flat change already scores 25.
pub fn change_score(change: f64) -> f64 {
    if change > 0.0 {
        return 0.0;
    }
    normalize(-change, &CHANGE_BANDS)
}

pub fn frequency_score(frequency: f64) -> f64 {
    normalize(frequency, &FREQUENCY_BANDS)
}

pub fn days_active_score(days_active: u32) -> f64 {
    normalize(f64::from(days_active), &DAYS_ACTIVE_BANDS)
}

pub fn size_score(size: u64) -> f64 {
    normalize(size as f64, &SIZE_BANDS)
}

pub fn cpa_score(cpa: f64, account_avg_cpa: f64) -> f64 {
    if account_avg_cpa <= 0.0 {
        return NEUTRAL_SCORE;
    }
    normalize(cpa / account_avg_cpa, &CPA_RATIO_BANDS)
}

pub fn roas_score(roas: f64) -> f64 {
    normalize(roas, &ROAS_BANDS)
}

pub fn freshness_score(days_since_update: u32) -> f64 {
    normalize(f64::from(days_since_update), &FRESHNESS_BANDS)
}

/// Rounds half toward positive infinity at the given number of decimals.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor + 0.5).floor() / factor
}

/// Rounds a composite 0-100 score to an integer score.
pub fn round_score(value: f64) -> u8 {
    round_half_up(value, 0).clamp(0.0, 100.0) as u8
}
