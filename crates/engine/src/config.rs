//! Service configuration via `xmodal.toml`
//!
//! A default `xmodal.toml` is written next to the data on first start. To
//! change settings, edit the file and restart. Values are validated eagerly
//! when the file is read.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use xmodal_core::{
    XmodalError, XmodalResult, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_RECENT_ITEMS,
    DEFAULT_SAVE_INTERVAL, EMBEDDING_DIM,
};

use crate::pipeline::PipelineOptions;
use crate::registry::RegistryOptions;
use crate::service::IndexOptions;

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "xmodal.toml";

/// Configuration loaded from `xmodal.toml`.
///
/// # Example
///
/// ```toml
/// dimension = 512
/// save_interval = 5
/// index_dir = "indexes"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmodalConfig {
    /// Embedding dimension shared by every encoder.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Save the default collection after every Nth add; 0 disables.
    #[serde(default = "default_save_interval")]
    pub save_interval: usize,
    /// Recent records reported by stats.
    #[serde(default = "default_recent_items")]
    pub recent_items: usize,
    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Directory for named collections, relative to the data directory.
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
    /// Persist named collections after every add.
    #[serde(default = "default_flush_on_write")]
    pub flush_on_write: bool,
}

fn default_dimension() -> usize {
    EMBEDDING_DIM
}

fn default_save_interval() -> usize {
    DEFAULT_SAVE_INTERVAL
}

fn default_recent_items() -> usize {
    DEFAULT_RECENT_ITEMS
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("indexes")
}

fn default_flush_on_write() -> bool {
    true
}

impl Default for XmodalConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            save_interval: default_save_interval(),
            recent_items: default_recent_items(),
            max_upload_bytes: default_max_upload_bytes(),
            index_dir: default_index_dir(),
            flush_on_write: default_flush_on_write(),
        }
    }
}

impl XmodalConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first bad field.
    pub fn validate(&self) -> XmodalResult<()> {
        if self.dimension == 0 {
            return Err(XmodalError::validation(
                "Invalid dimension 0 in xmodal.toml. Expected a positive integer.",
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(XmodalError::validation(
                "Invalid max_upload_bytes 0 in xmodal.toml. Expected a positive integer.",
            ));
        }
        if self.index_dir.as_os_str().is_empty() {
            return Err(XmodalError::validation(
                "Invalid empty index_dir in xmodal.toml.",
            ));
        }
        Ok(())
    }

    /// Options for the default collection's Index Service.
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            dimension: self.dimension,
            save_interval: self.save_interval,
            recent_items: self.recent_items,
        }
    }

    /// Options for the named-collection registry.
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            index: self.index_options(),
            flush_on_write: self.flush_on_write,
        }
    }

    /// Options for the ingestion pipeline.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            max_upload_bytes: self.max_upload_bytes,
        }
    }

    /// Registry directory resolved against `data_dir`.
    pub fn index_dir_in(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.index_dir)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# xmodal configuration
#
# Embedding dimension shared by every encoder (default: 512).
# Changing it requires resetting existing collections.
dimension = 512

# Save the default collection after every Nth add (default: 5).
# 0 disables periodic saves; explicit saves still work.
save_interval = 5

# Recent records reported by stats (default: 10).
recent_items = 10

# Largest accepted upload in bytes (default: 50 MiB).
max_upload_bytes = 52428800

# Directory for named collections, relative to the data directory.
index_dir = "indexes"

# Persist named collections after every add (default: true).
flush_on_write = true
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> XmodalResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            XmodalError::storage(
                format!("Failed to read config file '{}'", path.display()),
                e,
            )
        })?;
        let config: XmodalConfig = toml::from_str(&content).map_err(|e| {
            XmodalError::validation(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        info!(target: "xmodal::config", path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> XmodalResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                XmodalError::storage(
                    format!("Failed to write default config file '{}'", path.display()),
                    e,
                )
            })?;
            info!(target: "xmodal::config", path = %path.display(), "Default config written");
        }
        Ok(())
    }

    /// Load `xmodal.toml` from `data_dir`, writing the default first if
    /// it is missing.
    pub fn load_or_init(data_dir: &Path) -> XmodalResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            XmodalError::storage(format!("Failed to create '{}'", data_dir.display()), e)
        })?;
        let path = data_dir.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        Self::from_file(&path)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> XmodalResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            XmodalError::serialization(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content).map_err(|e| {
            XmodalError::storage(
                format!("Failed to write config file '{}'", path.display()),
                e,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_toml_matches_defaults() {
        let config: XmodalConfig = toml::from_str(XmodalConfig::default_toml()).unwrap();
        assert_eq!(config, XmodalConfig::default());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();

        let config = XmodalConfig::from_file(&path).unwrap();
        assert_eq!(config.dimension, 512);
        assert_eq!(config.save_interval, 5);
        assert!(config.flush_on_write);
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "save_interval = 0\n").unwrap();

        XmodalConfig::write_default_if_missing(&path).unwrap();

        let config = XmodalConfig::from_file(&path).unwrap();
        assert_eq!(config.save_interval, 0);
    }

    #[test]
    fn zero_dimension_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "dimension = 0\n").unwrap();
        assert!(XmodalConfig::from_file(&path)
            .unwrap_err()
            .is_validation_error());
    }

    #[test]
    fn unparseable_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "dimension = \"wide\"\n").unwrap();
        assert!(XmodalConfig::from_file(&path).is_err());
    }

    #[test]
    fn load_or_init_creates_file() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let config = XmodalConfig::load_or_init(&data).unwrap();
        assert!(data.join(CONFIG_FILE_NAME).exists());
        assert_eq!(config.index_dir_in(&data), data.join("indexes"));
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = XmodalConfig {
            dimension: 768,
            flush_on_write: false,
            ..XmodalConfig::default()
        };
        config.write_to_file(&path).unwrap();
        assert_eq!(XmodalConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn derived_options() {
        let config = XmodalConfig {
            save_interval: 7,
            flush_on_write: false,
            ..XmodalConfig::default()
        };
        assert_eq!(config.index_options().save_interval, 7);
        assert!(!config.registry_options().flush_on_write);
        assert_eq!(
            config.pipeline_options().max_upload_bytes,
            DEFAULT_MAX_UPLOAD_BYTES
        );
    }
}
