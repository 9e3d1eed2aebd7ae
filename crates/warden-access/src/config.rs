//! Access engine configuration
//!
//! Loaded from a TOML table, optionally overridden from `WARDEN_ACCESS_*`
//! environment variables, then validated.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{AccessError, AccessResult};

const ENV_PREFIX: &str = "WARDEN_ACCESS_";

/// Tunables for chain resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Deadline for the whole chain-discovery call, in milliseconds
    pub discovery_timeout_ms: u64,

    /// Deadline for each credential registry lookup, in milliseconds
    pub lookup_timeout_ms: u64,

    /// Maximum number of chains resolved concurrently
    pub max_concurrent_chains: usize,

    /// Whether a credential the registry reports as expired still counts.
    ///
    /// Expiry only bounds the credential's window, so expired credentials
    /// keep granting access to data recorded before they lapsed.
    pub accept_expired: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: 5_000,
            lookup_timeout_ms: 2_000,
            max_concurrent_chains: 16,
            accept_expired: true,
        }
    }
}

impl AccessConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> AccessResult<Self> {
        toml::from_str(content)
            .map_err(|e| AccessError::config(format!("Invalid access config: {e}")))
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> AccessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AccessError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment.
    pub fn merge_with_env(&mut self) -> AccessResult<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs; names without the
    /// `WARDEN_ACCESS_` prefix are ignored.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> AccessResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            self.set_from_string(&field.to_ascii_lowercase(), &value)?;
        }
        Ok(())
    }

    /// Set a single field by name.
    pub fn set_from_string(&mut self, key: &str, value: &str) -> AccessResult<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> AccessResult<T> {
            value
                .trim()
                .parse()
                .map_err(|_| AccessError::config(format!("Invalid value '{value}' for {key}")))
        }

        match key {
            "discovery_timeout_ms" => self.discovery_timeout_ms = parse(key, value)?,
            "lookup_timeout_ms" => self.lookup_timeout_ms = parse(key, value)?,
            "max_concurrent_chains" => self.max_concurrent_chains = parse(key, value)?,
            "accept_expired" => self.accept_expired = parse(key, value)?,
            other => {
                return Err(AccessError::config(format!(
                    "Unknown access config key '{other}'"
                )))
            }
        }
        Ok(())
    }

    /// Reject zero deadlines and zero concurrency.
    pub fn validate(&self) -> AccessResult<()> {
        if self.discovery_timeout_ms == 0 {
            return Err(AccessError::config("discovery_timeout_ms must be non-zero"));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(AccessError::config("lookup_timeout_ms must be non-zero"));
        }
        if self.max_concurrent_chains == 0 {
            return Err(AccessError::config("max_concurrent_chains must be non-zero"));
        }
        Ok(())
    }

    /// Discovery deadline.
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    /// Per-lookup deadline.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}
