//! CLI configuration file
//!
//! ```toml
//! fixture = "fixtures/campus.toml"
//!
//! [access]
//! lookup_timeout_ms = 500
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use warden_access::AccessConfig;

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Engine tunables
    pub access: AccessConfig,

    /// Fixture world describing credentials, chains and streams
    pub fixture: Option<PathBuf>,
}

impl CliConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    ///
    /// `WARDEN_ACCESS_*` variables override the file. A relative fixture
    /// path is taken relative to the config file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let mut config: CliConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config {}", path.display()))?;
            if let (Some(fixture), Some(dir)) = (config.fixture.as_mut(), path.parent()) {
                if fixture.is_relative() {
                    *fixture = dir.join(&*fixture);
                }
            }
            config
        } else {
            tracing::debug!(path = %path.display(), "Config file not found; using defaults");
            CliConfig::default()
        };

        config.access.merge_with_env()?;
        config.access.validate()?;
        Ok(config)
    }
}
