use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "adscore.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub currency: Option<String>,
    pub strict: Option<bool>,
    pub min_audit_score: Option<u8>,
    pub account_avg_cpa: Option<f64>,
    pub anomaly_threshold: Option<f64>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }

    /// Loads `adscore.toml` from the working directory. `None` when the file is absent;
    /// a file that exists but fails to load is returned as an error.
    pub fn discover() -> Option<anyhow::Result<Self>> {
        Self::discover_in(Path::new("."))
    }

    pub fn discover_in(dir: &Path) -> Option<anyhow::Result<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        path.exists().then(|| Config::load(&path))
    }
}
