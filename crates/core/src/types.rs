use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudienceType {
    Custom,
    Lookalike,
    Saved,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudienceMetrics {
    pub cpa: f64,
    pub roas: f64,
    pub conversions: u64,
    pub reach: u64,
    pub spend: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Audience {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub audience_type: AudienceType,
    pub size: u64,
    #[serde(default)]
    pub health_score: Option<u8>,
    #[serde(default)]
    pub days_since_update: u32,
    #[serde(default)]
    pub metrics: AudienceMetrics,
}

impl Audience {
    pub fn is_lookalike(&self) -> bool {
        self.audience_type == AudienceType::Lookalike
    }
}

/// Renders an integer with thousands separators, e.g. `1234567` as `1,234,567`.
pub fn format_number(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let bytes = s.as_bytes();
    let mut result = String::with_capacity(s.len() + s.len() / 3 + 1);
    if n < 0 {
        result.push('-');
    }
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(b as char);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_inserts_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_number(-20_000), "-20,000");
    }

    #[test]
    fn audience_deserializes_with_optional_fields() {
        let json = r#"{"id":"a1","name":"Buyers","type":"CUSTOM","size":2000}"#;
        let audience: Audience = serde_json::from_str(json).unwrap();
        assert_eq!(audience.audience_type, AudienceType::Custom);
        assert_eq!(audience.health_score, None);
        assert_eq!(audience.metrics, AudienceMetrics::default());
        assert!(!audience.is_lookalike());
    }

    #[test]
    fn severity_orders_low_to_critical() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
    }
}
