//! Optional YAML settings file for the CLI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use wmiquery_core::MismatchMode;
use wmiquery_observability::LogConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub mismatch_mode: MismatchMode,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }
}
