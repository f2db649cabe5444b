use std::io::Write;

use adscore_core::config::Config;

#[test]
fn parse_valid_toml() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        r#"
currency = "NT$"
strict = true
min_audit_score = 70
account_avg_cpa = 15.5
anomaly_threshold = 25.0
"#
    )
    .unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.currency.as_deref(), Some("NT$"));
    assert_eq!(cfg.strict, Some(true));
    assert_eq!(cfg.min_audit_score, Some(70));
    assert_eq!(cfg.account_avg_cpa, Some(15.5));
    assert_eq!(cfg.anomaly_threshold, Some(25.0));
}

#[test]
fn parse_empty_toml_gives_defaults() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "").unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.currency, None);
    assert_eq!(cfg.strict, None);
    assert_eq!(cfg.min_audit_score, None);
    assert_eq!(cfg.account_avg_cpa, None);
    assert_eq!(cfg.anomaly_threshold, None);
}

#[test]
fn out_of_range_score_threshold_is_rejected() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "min_audit_score = 300").unwrap();

    assert!(Config::load(f.path()).is_err());
}

#[test]
fn parse_invalid_toml_returns_error() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "this is not valid [ toml {{{{").unwrap();

    let result = Config::load(f.path());
    assert!(result.is_err());
}

#[test]
fn discover_reports_broken_file_instead_of_dropping_it() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::discover_in(dir.path()).is_none());

    std::fs::write(dir.path().join("adscore.toml"), "strict = \"yes\"").unwrap();
    let found = Config::discover_in(dir.path()).expect("file present");
    assert!(found.is_err());

    std::fs::write(dir.path().join("adscore.toml"), "min_audit_score = 75").unwrap();
    let cfg = Config::discover_in(dir.path()).unwrap().unwrap();
    assert_eq!(cfg.min_audit_score, Some(75));
}
