//! Resource names and resource-name patterns.
//!
//! Resources are slash-separated paths such as `campus/bldg1/hvac/temp`.
//! Patterns may use `+` to match exactly one segment and a trailing `*` to
//! match zero or more remaining segments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::WardenError;

const SINGLE: &str = "+";
const MULTI: &str = "*";

fn segments(raw: &str) -> impl Iterator<Item = &str> {
    raw.trim_matches('/').split('/')
}

fn check_segments(raw: &str) -> Result<(), WardenError> {
    if raw.trim_matches('/').is_empty() {
        return Err(WardenError::invalid("resource name is empty"));
    }
    if segments(raw).any(str::is_empty) {
        return Err(WardenError::invalid(format!(
            "resource '{raw}' contains an empty segment"
        )));
    }
    Ok(())
}

/// A concrete resource name, free of wildcards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUri(String);

impl ResourceUri {
    /// Parse a concrete resource name.
    pub fn new(raw: impl Into<String>) -> Result<Self, WardenError> {
        let raw = raw.into();
        check_segments(&raw)?;
        if segments(&raw).any(|s| s == SINGLE || s == MULTI) {
            return Err(WardenError::invalid(format!(
                "resource '{raw}' is a pattern, a concrete resource is required"
            )));
        }
        Ok(Self(raw.trim_matches('/').to_string()))
    }

    /// Borrow the canonical name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceUri {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceUri {
    type Error = WardenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceUri> for String {
    fn from(value: ResourceUri) -> Self {
        value.0
    }
}

/// A resource-name pattern a credential is granted on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePattern(String);

impl ResourcePattern {
    /// Parse a pattern; `*` is only allowed as the final segment.
    pub fn new(raw: impl Into<String>) -> Result<Self, WardenError> {
        let raw = raw.into();
        check_segments(&raw)?;
        let parts: Vec<&str> = segments(&raw).collect();
        if let Some(pos) = parts.iter().position(|s| *s == MULTI) {
            if pos + 1 != parts.len() {
                return Err(WardenError::invalid(format!(
                    "pattern '{raw}' uses '*' before the final segment"
                )));
            }
        }
        Ok(Self(raw.trim_matches('/').to_string()))
    }

    /// Borrow the canonical pattern.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the pattern contains any wildcard.
    pub fn is_concrete(&self) -> bool {
        !self.0.split('/').any(|s| s == SINGLE || s == MULTI)
    }

    /// Whether `resource` falls under this pattern.
    pub fn matches(&self, resource: &ResourceUri) -> bool {
        let mut pattern = self.0.split('/');
        let mut target = resource.segments();
        loop {
            match (pattern.next(), target.next()) {
                (Some(MULTI), _) => return true,
                (Some(SINGLE), Some(_)) => {}
                (Some(p), Some(t)) if p == t => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourcePattern {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourcePattern {
    type Error = WardenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourcePattern> for String {
    fn from(value: ResourcePattern) -> Self {
        value.0
    }
}

impl From<ResourceUri> for ResourcePattern {
    fn from(value: ResourceUri) -> Self {
        Self(value.0)
    }
}
