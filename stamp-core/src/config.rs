//! Project configuration — `.stamp.yaml`.
//!
//! # Layout
//!
//! ```text
//! header: |
//!   /*! ${pkg.name} v${pkg.version} | ${license} */
//! context:
//!   pkg: { name: demo, version: 1.2.0 }
//!   license: MIT
//! extensions: [js, css]
//! ```
//!
//! `header_file` may be used instead of `header`; a relative `header_file`
//! is resolved against the directory holding the config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{io_err, ConfigError};

/// File name looked up by [`load_at`].
pub const CONFIG_FILE_NAME: &str = ".stamp.yaml";

/// Settings shared by every stamp command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StampConfig {
    /// Inline header template.
    pub header: Option<String>,
    /// Path to a header template file.
    pub header_file: Option<PathBuf>,
    /// Static template context.
    pub context: Map<String, Value>,
    /// Extensions (without the dot) picked up when walking directories.
    /// Empty means every file.
    pub extensions: Vec<String>,
    /// Root used to compute each file's relative path.
    pub base: Option<PathBuf>,
    /// Use the header verbatim, without placeholder substitution.
    pub raw: bool,
}

impl StampConfig {
    /// The header text, reading `header_file` when set.
    pub fn header_text(&self) -> Result<Option<String>, ConfigError> {
        match (&self.header, &self.header_file) {
            (Some(header), _) => Ok(Some(header.clone())),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(Some)
                .map_err(|e| io_err(path, e)),
            (None, None) => Ok(None),
        }
    }

    /// Whether `path` passes the extension filter.
    pub fn matches_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Load `<dir>/.stamp.yaml`, or defaults when it does not exist.
pub fn load_at(dir: &Path) -> Result<StampConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(StampConfig::default());
    }
    load_file(&path)
}

/// Load an explicit config file.
pub fn load_file(path: &Path) -> Result<StampConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let mut config: StampConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if config.header.is_some() && config.header_file.is_some() {
        return Err(ConfigError::ConflictingHeader {
            path: path.to_path_buf(),
        });
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    if let Some(header_file) = config.header_file.take() {
        config.header_file = Some(if header_file.is_relative() {
            dir.join(header_file)
        } else {
            header_file
        });
    }
    if let Some(base) = config.base.take() {
        config.base = Some(if base.is_relative() { dir.join(base) } else { base });
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
