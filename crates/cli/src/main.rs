use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use adscore_core::anomaly::{AnomalyLevel, DEFAULT_ANOMALY_THRESHOLD};
use adscore_core::audience_health::{calculate_audience_health, AudienceHealthInput};
use adscore_core::audit::AuditGrade;
use adscore_core::config::{Config, CONFIG_FILE_NAME};
use adscore_core::fatigue::{calculate_fatigue_score, FatigueInput, FatigueStatus};
use adscore_core::overlap::{
    calculate_overlap_percentage, get_overlap_status, get_overlap_suggestion,
};
use adscore_core::period::{calculate_period_change, format_period_comparison};
use adscore_core::repair::{
    calculate_estimated_time, format_minutes, get_repair_steps, has_repair_guide,
};
use adscore_core::report::Report;
use adscore_core::types::Severity;
use adscore_core::{analyze_file, AnalyzeOptions, DEFAULT_CURRENCY};

#[derive(Parser, Debug)]
#[command(
    name = "adscore",
    version,
    about = "Ad account health scoring: fatigue, audience health, audit, overlap, expansion"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score an account snapshot and write report files.
    #[command(alias = "analyse")]
    Analyze {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        strict: bool,

        #[arg(long, default_value = "adscore-out")]
        out: PathBuf,

        #[arg(long)]
        min_audit_score: Option<u8>,

        #[arg(long)]
        currency: Option<String>,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Creative fatigue score for one creative.
    Fatigue {
        #[arg(long, allow_negative_numbers = true)]
        ctr_change: f64,

        #[arg(long)]
        frequency: f64,

        #[arg(long)]
        days_active: u32,

        #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
        conversion_rate_change: f64,
    },

    /// Health score for one audience.
    AudienceHealth {
        #[arg(long)]
        size: u64,

        #[arg(long)]
        cpa: f64,

        #[arg(long)]
        account_avg_cpa: f64,

        #[arg(long)]
        roas: f64,

        #[arg(long, default_value_t = 0)]
        days_since_update: u32,
    },

    /// Overlap percentage and suggestion for two audiences.
    Overlap {
        #[arg(long)]
        size_a: u64,

        #[arg(long)]
        size_b: u64,

        #[arg(long)]
        overlap_count: u64,
    },

    /// Repair steps for an audit issue code.
    RepairGuide { code: String },

    /// Period-over-period change for one metric.
    Period {
        #[arg(long, allow_negative_numbers = true)]
        current: f64,

        #[arg(long, allow_negative_numbers = true)]
        previous: f64,

        /// Lower is better (CPA, cost).
        #[arg(long)]
        inverted: bool,
    },
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
    All,
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    orange: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    orange: "\x1b[38;5;208m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    orange: "",
    reset: "",
};

fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level) {
        let s = style();
        eprintln!(
            "{}{yellow}warning:{reset} {:#}",
            s.bold,
            e,
            yellow = s.yellow,
            reset = s.reset
        );
    }

    let res = match cli.cmd {
        Commands::Analyze {
            input,
            strict,
            out,
            min_audit_score,
            currency,
            config,
            output_format,
        } => {
            let cfg = load_config(config.as_deref());
            let opts = AnalyzeOptions {
                strict: strict || cfg.strict.unwrap_or(false),
                currency: currency
                    .or(cfg.currency)
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                min_audit_score: min_audit_score.or(cfg.min_audit_score),
                account_avg_cpa: cfg.account_avg_cpa,
                anomaly_threshold: cfg.anomaly_threshold.unwrap_or(DEFAULT_ANOMALY_THRESHOLD),
            };
            run_analyze(&input, opts, &out, &output_format)
        }
        Commands::Fatigue {
            ctr_change,
            frequency,
            days_active,
            conversion_rate_change,
        } => print_json(&calculate_fatigue_score(&FatigueInput {
            ctr_change,
            frequency,
            days_active,
            conversion_rate_change,
        })),
        Commands::AudienceHealth {
            size,
            cpa,
            account_avg_cpa,
            roas,
            days_since_update,
        } => print_json(&calculate_audience_health(&AudienceHealthInput {
            size,
            cpa,
            account_avg_cpa,
            roas,
            days_since_update,
        })),
        Commands::Overlap {
            size_a,
            size_b,
            overlap_count,
        } => {
            let pct = calculate_overlap_percentage(size_a, size_b, overlap_count);
            print_json(&serde_json::json!({
                "overlap_percentage": pct,
                "status": get_overlap_status(pct),
                "suggestion": get_overlap_suggestion(pct),
            }))
        }
        Commands::RepairGuide { code } => {
            let steps = get_repair_steps(&code);
            let minutes = calculate_estimated_time(&steps);
            print_json(&serde_json::json!({
                "code": code,
                "has_guide": has_repair_guide(&code),
                "estimated_minutes": minutes,
                "estimated_time": format_minutes(minutes),
                "steps": steps,
            }))
        }
        Commands::Period {
            current,
            previous,
            inverted,
        } => print_json(&format_period_comparison(
            calculate_period_change(current, previous),
            inverted,
        )),
    };

    match res {
        Ok(code) => code,
        Err(e) => {
            let s = style();
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            std::process::ExitCode::from(1)
        }
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level/filter '{level}'"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::env::var_os("NO_COLOR").is_none())
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<std::process::ExitCode> {
    let json = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{json}");
    Ok(std::process::ExitCode::SUCCESS)
}

fn print_banner() {
    let s = style();
    eprintln!(
        "\n  {bold}ad{reset}{orange}|{reset}{dim}score{reset}  {dim}ad account health scoring{reset}\n",
        bold = s.bold,
        orange = s.orange,
        dim = s.dim,
        reset = s.reset,
    );
}

fn grade_color(grade: AuditGrade) -> &'static str {
    let s = style();
    match grade {
        AuditGrade::Excellent | AuditGrade::Good => s.green,
        AuditGrade::NeedsImprovement => s.yellow,
        AuditGrade::Critical => s.red,
    }
}

fn severity_color(sev: &Severity) -> &'static str {
    let s = style();
    match sev {
        Severity::Critical => s.red,
        Severity::High => s.orange,
        Severity::Medium => s.yellow,
        Severity::Low => s.dim,
    }
}

fn print_report(report: &Report, out: &Path) {
    let s = style();
    let audit = &report.audit.result;
    let gc = grade_color(audit.grade);

    eprintln!(
        "  {dim}audit_score  {reset}{gc}{bold}{}{reset} {dim}({}){reset}",
        audit.overall_score,
        audit.grade.as_str(),
        dim = s.dim,
        gc = gc,
        bold = s.bold,
        reset = s.reset
    );
    for (category, d) in audit.dimensions.iter() {
        eprintln!(
            "  {dim}  {:<10} {reset}{bold}{:>3}{reset}",
            category.as_str(),
            d.score,
            dim = s.dim,
            bold = s.bold,
            reset = s.reset
        );
    }

    let fatigued = report
        .creatives
        .iter()
        .filter(|c| c.fatigue.status == FatigueStatus::Fatigued)
        .count();
    eprintln!(
        "  {dim}creatives    {reset}{bold}{}{reset} {dim}({} fatigued){reset}",
        report.creatives.len(),
        fatigued,
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!(
        "  {dim}audiences    {reset}{bold}{}{reset} {dim}({} expansion candidates){reset}",
        report.audiences.len(),
        report.expansion_candidates.len(),
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );

    if !report.audit.findings.is_empty() {
        eprintln!();
        for f in &report.audit.findings {
            let sc = severity_color(&f.severity);
            eprintln!(
                "  {sc}{:?}{reset}  {}  {dim}{}{reset}",
                f.severity,
                f.code,
                f.title,
                sc = sc,
                dim = s.dim,
                reset = s.reset
            );
        }
    }

    if let Some(period) = &report.period {
        for a in &period.anomalies {
            let ac = if a.level == AnomalyLevel::Critical {
                s.red
            } else {
                s.yellow
            };
            eprintln!(
                "  {ac}anomaly{reset}  {} {:+.1}%",
                a.metric,
                a.change,
                ac = ac,
                reset = s.reset
            );
        }
    }

    eprintln!();
    for name in ["report.json", "report.md"] {
        let path = out.join(name);
        if path.exists() {
            eprintln!(
                "  {dim}\u{2192} {}{reset}",
                path.display(),
                dim = s.dim,
                reset = s.reset
            );
        }
    }
    eprintln!();
}

fn load_config(path: Option<&Path>) -> Config {
    let (shown, loaded) = match path {
        Some(p) => (p.to_path_buf(), Config::load(p)),
        None => match Config::discover() {
            Some(res) => (PathBuf::from(CONFIG_FILE_NAME), res),
            None => return Config::default(),
        },
    };

    loaded.unwrap_or_else(|e| {
        eprintln!(
            "{}{}warning:{} failed to load config {}: {:#}",
            style().bold,
            style().yellow,
            style().reset,
            shown.display(),
            e
        );
        Config::default()
    })
}

fn run_analyze(
    input: &Path,
    opts: AnalyzeOptions,
    out: &Path,
    output_format: &OutputFormat,
) -> anyhow::Result<std::process::ExitCode> {
    let s = style();

    print_banner();
    tracing::debug!(input = %input.display(), out = %out.display(), strict = opts.strict, "analyze");

    let report = analyze_file(input, opts)?;

    std::fs::create_dir_all(out).with_context(|| format!("create out dir {}", out.display()))?;

    let write_json = matches!(output_format, OutputFormat::Json | OutputFormat::All);
    let write_md = matches!(output_format, OutputFormat::Markdown | OutputFormat::All);

    if write_json {
        let json_path = out.join("report.json");
        let json = serde_json::to_vec_pretty(&report).context("serialize report json")?;
        std::fs::write(&json_path, json)
            .with_context(|| format!("write {}", json_path.display()))?;
    }

    if write_md {
        let md_path = out.join("report.md");
        std::fs::write(&md_path, report.to_markdown())
            .with_context(|| format!("write {}", md_path.display()))?;
    }

    // Machine-parseable line on stdout
    println!(
        "audit_score={} grade={} issues={}",
        report.audit.result.overall_score,
        report.audit.result.grade.as_str(),
        report.audit.result.total_issues
    );

    // Human-readable output on stderr
    print_report(&report, out);

    let exit = match &report.gate {
        Some(g) if !g.pass => {
            eprintln!(
                "  {red}{bold}GATE FAILED{reset}  {dim}({}){reset}",
                g.reason,
                red = s.red,
                bold = s.bold,
                dim = s.dim,
                reset = s.reset,
            );
            std::process::ExitCode::from(2)
        }
        _ => {
            eprintln!(
                "  {green}{bold}PASS{reset}",
                green = s.green,
                bold = s.bold,
                reset = s.reset
            );
            std::process::ExitCode::from(0)
        }
    };

    eprintln!();

    Ok(exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn grade_color_thresholds() {
        assert_eq!(grade_color(AuditGrade::Excellent), style().green);
        assert_eq!(grade_color(AuditGrade::Good), style().green);
        assert_eq!(grade_color(AuditGrade::NeedsImprovement), style().yellow);
        assert_eq!(grade_color(AuditGrade::Critical), style().red);
    }

    #[test]
    #[serial]
    fn severity_color_thresholds() {
        assert_eq!(severity_color(&Severity::Critical), style().red);
        assert_eq!(severity_color(&Severity::High), style().orange);
        assert_eq!(severity_color(&Severity::Medium), style().yellow);
        assert_eq!(severity_color(&Severity::Low), style().dim);
    }

    #[test]
    #[serial]
    fn style_respects_no_color() {
        std::env::set_var("NO_COLOR", "1");
        assert_eq!(style().bold, "");
        std::env::remove_var("NO_COLOR");
        assert_ne!(style().bold, "");
    }

    #[test]
    fn analyse_alias_parses() {
        let cli = Cli::try_parse_from(["adscore", "analyse", "--input", "snap.json"]).unwrap();
        match cli.cmd {
            Commands::Analyze { input, out, .. } => {
                assert_eq!(input, PathBuf::from("snap.json"));
                assert_eq!(out, PathBuf::from("adscore-out"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn fatigue_accepts_negative_changes() {
        let cli = Cli::try_parse_from([
            "adscore",
            "fatigue",
            "--ctr-change",
            "-15",
            "--frequency",
            "3.2",
            "--days-active",
            "21",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Fatigue {
                ctr_change,
                conversion_rate_change,
                ..
            } => {
                assert_eq!(ctr_change, -15.0);
                assert_eq!(conversion_rate_change, 0.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn missing_config_falls_back_to_defaults() {
        let cfg = load_config(Some(Path::new("does-not-exist.toml")));
        assert!(cfg.currency.is_none());
        assert!(cfg.min_audit_score.is_none());
    }
}
