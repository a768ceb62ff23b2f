//! Logging initialisation.
//!
//! Log output goes to stderr so decoded records on stdout stay parseable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Line format of emitted events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Level overrides keyed by tracing target. The workspace crates can be
    /// named by their short names: `core`, `worker`, `observability`.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            targets: BTreeMap::new(),
            format: LogFormat::default(),
        }
    }
}

impl LogConfig {
    /// `EnvFilter` syntax, e.g. `"warn,wmiquery_core=debug"`.
    pub fn filter_directives(&self) -> String {
        self.targets
            .iter()
            .fold(self.level.clone(), |mut acc, (target, level)| {
                acc.push(',');
                acc.push_str(&qualified_target(target));
                acc.push('=');
                acc.push_str(level);
                acc
            })
    }
}

fn qualified_target(name: &str) -> String {
    match name {
        "core" | "worker" | "observability" => format!("wmiquery_{name}"),
        other => other.replace('-', "_"),
    }
}

/// Install the global subscriber. Fails if one is already set.
///
/// An unparsable filter falls back to `info`; the problem is logged once the
/// subscriber is up.
pub fn init_tracing(config: &LogConfig) -> Result<(), TryInitError> {
    let directives = config.filter_directives();
    let (filter, rejected) = match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("info"), Some(e)),
    };

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
    }

    if let Some(e) = rejected {
        tracing::warn!(%directives, error = %e, "invalid log filter, using info");
    }
    Ok(())
}
