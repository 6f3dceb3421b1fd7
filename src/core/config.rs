//! Adapter configuration
//!
//! Two pieces of the environment are configurable: where the engine
//! believes its data directory lives, and where scratch files land on the
//! plain filesystem. Both default to the values used by the enclave
//! deployment (`/data/` with the scratch root at the working directory).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Data-root prefix assumed when none is configured
pub const DEFAULT_DATA_ROOT: &str = "/data/";

/// Settings for a syscall adapter instance
///
/// # Examples
///
/// ```
/// use kvfs::KvfsConfig;
///
/// let config = KvfsConfig::from_toml_str(r#"
///     data_root = "/var/lib/engine"
///     scratch_root = "/tmp/engine-scratch"
/// "#).unwrap();
///
/// // The data root always carries a trailing slash.
/// assert_eq!(config.data_root(), "/var/lib/engine/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvfsConfig {
    /// Absolute prefix under which the engine addresses its data directory
    ///
    /// Paths carrying this prefix are rewritten to the relative form the
    /// store is keyed by. Stored with a trailing slash so that a sibling
    /// directory sharing the prefix text cannot match.
    #[serde(default = "default_data_root")]
    data_root: String,

    /// Root of the scratch filesystem for in-progress temp files
    ///
    /// Rewritten relative paths resolve against this directory whenever the
    /// adapter touches the plain filesystem.
    #[serde(default = "default_scratch_root")]
    scratch_root: PathBuf,
}

impl KvfsConfig {
    /// Create a configuration from explicit roots
    pub fn new(data_root: impl Into<String>, scratch_root: impl Into<PathBuf>) -> Self {
        let mut config = KvfsConfig {
            data_root: data_root.into(),
            scratch_root: scratch_root.into(),
        };
        config.normalize();
        config
    }

    /// Parse a configuration from TOML text
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: KvfsConfig = toml::from_str(text)?;
        config.normalize();
        Ok(config)
    }

    /// Data-root prefix, always ending in `/`
    pub fn data_root(&self) -> &str {
        &self.data_root
    }

    /// Scratch filesystem root
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    fn normalize(&mut self) {
        if !self.data_root.ends_with('/') {
            self.data_root.push('/');
        }
    }
}

impl Default for KvfsConfig {
    fn default() -> Self {
        KvfsConfig::new(default_data_root(), default_scratch_root())
    }
}

fn default_data_root() -> String {
    DEFAULT_DATA_ROOT.to_string()
}

fn default_scratch_root() -> PathBuf {
    PathBuf::from(".")
}
