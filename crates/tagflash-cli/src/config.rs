use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tagflash_session::SessionConfig;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON file holding the override values.
    pub store_path: PathBuf,
    pub session: SessionConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("tagflash-values.json"),
            session: SessionConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from `path`, or defaults when no path is given. `store`
    /// replaces the configured store path.
    pub fn load(path: Option<&Path>, store: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        if let Some(store) = store {
            config.store_path = store;
        }
        Ok(config)
    }
}
