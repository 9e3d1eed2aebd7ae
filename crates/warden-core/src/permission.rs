//! Permissions and permission sets carried by credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::WardenError;

/// An operation class a credential may grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Subscribe to published data
    #[serde(rename = "can-consume")]
    Consume,
    /// Publish data
    #[serde(rename = "can-publish")]
    Publish,
    /// List child resources
    #[serde(rename = "can-list")]
    List,
    /// Read archived data and metadata
    #[serde(rename = "read")]
    Read,
}

impl Permission {
    /// All permissions, in bit order.
    pub const ALL: [Permission; 4] = [
        Permission::Consume,
        Permission::Publish,
        Permission::List,
        Permission::Read,
    ];

    const fn bit(self) -> u8 {
        match self {
            Permission::Consume => 1 << 0,
            Permission::Publish => 1 << 1,
            Permission::List => 1 << 2,
            Permission::Read => 1 << 3,
        }
    }

    /// Canonical long name.
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Consume => "can-consume",
            Permission::Publish => "can-publish",
            Permission::List => "can-list",
            Permission::Read => "read",
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'C' => Some(Permission::Consume),
            'P' => Some(Permission::Publish),
            'L' => Some(Permission::List),
            'R' => Some(Permission::Read),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "can-consume" | "consume" => Ok(Permission::Consume),
            "can-publish" | "publish" => Ok(Permission::Publish),
            "can-list" | "list" => Ok(Permission::List),
            "read" | "can-read" => Ok(Permission::Read),
            other => {
                let mut chars = other.chars();
                match (chars.next().and_then(Permission::from_letter), chars.next()) {
                    (Some(permission), None) => Ok(permission),
                    _ => Err(WardenError::invalid(format!("unknown permission '{other}'"))),
                }
            }
        }
    }
}

/// A set of permissions stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionSet(u8);

impl PermissionSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Add a permission.
    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.bit();
    }

    /// Whether the permission is literally present.
    pub fn contains(&self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// Whether holding this set authorizes `permission`.
    ///
    /// Consuming a resource implies reading what was archived from it.
    pub fn grants(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => self.contains(Permission::Read) || self.contains(Permission::Consume),
            other => self.contains(other),
        }
    }

    /// Whether no permission is present.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Present permissions, in bit order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> {
        let set = *self;
        Permission::ALL.into_iter().filter(move |p| set.contains(*p))
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::empty();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Permission::as_str).collect();
        f.write_str(&names.join(","))
    }
}

/// Accepts a comma-separated list of names, or a compact letter string
/// such as `"CP"`.
impl FromStr for PermissionSet {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::empty());
        }
        if s.contains(',') || s.contains('-') || s.chars().any(|c| c.is_ascii_lowercase()) {
            return s.split(',').map(str::parse::<Permission>).collect();
        }
        s.chars()
            .map(|c| {
                Permission::from_letter(c)
                    .ok_or_else(|| WardenError::invalid(format!("unknown permission letter '{c}'")))
            })
            .collect()
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let permissions = Vec::<Permission>::deserialize(deserializer)?;
        Ok(permissions.into_iter().collect())
    }
}
