//! Run configuration.
//!
//! A YAML file with parameter defaults applied under every element's own
//! attributes:
//!
//! ```yaml
//! defaults:
//!   zigzag_spacing_mm: 0.35
//!   contour_underlay: true
//!   pull_compensation_mm: "0.2 0.1"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

use needlepath::params::find_param;

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    defaults: HashMap<String, serde_yaml::Value>,
}

#[derive(Debug, Default, Clone)]
pub struct Config {
    defaults: HashMap<String, String>,
}

impl Config {
    /// Load `path`, or an empty config when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)?;
        let mut defaults = HashMap::new();
        for (name, value) in raw.defaults {
            if find_param(&name).is_none() {
                warn!("unknown parameter {:?} in config", name);
            }
            let text = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                other => {
                    warn!("ignoring non-scalar value for {:?}: {:?}", name, other);
                    continue;
                }
            };
            defaults.insert(name, text);
        }
        Ok(Self { defaults })
    }

    pub fn defaults(&self) -> &HashMap<String, String> {
        &self.defaults
    }
}
