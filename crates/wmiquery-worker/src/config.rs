//! Query service configuration.

use serde::{Deserialize, Serialize};
use wmiquery_core::MismatchMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Name of the OS thread that owns the provider.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
    /// Namespace passed to every query, e.g. `root\cimv2`. `None` lets the
    /// provider pick its default.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub mismatch_mode: MismatchMode,
}

fn default_thread_name() -> String { "wmiquery-affinity".into() }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            namespace: None,
            mismatch_mode: MismatchMode::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}
