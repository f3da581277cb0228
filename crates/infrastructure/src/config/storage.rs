//! Draft store backend selection.

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Backing store for drafts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on exit
    Memory,
    /// Embedded on-disk database
    #[default]
    Redb,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redb => write!(f, "redb"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "redb" | "disk" => Ok(Self::Redb),
            _ => Err(format!("Invalid storage backend: {s}. Use 'memory' or 'redb'")),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file for the redb backend
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Optional quota over all stored keys and values, in bytes
    #[serde(default)]
    pub capacity_bytes: Option<usize>,
}

fn default_path() -> PathBuf {
    PathBuf::from("drafts.redb")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
            capacity_bytes: None,
        }
    }
}
