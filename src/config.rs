//! Server configuration
//!
//! Stored as TOML at `config/updater.toml` under the server root. Every key
//! is optional; missing keys take the defaults below.

use crate::archive::{ArchiveBuilder, Compression, DEFAULT_STREAM_THRESHOLD};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/updater.toml";

/// Scalar settings the manifest pipeline reads but never interprets.
pub trait ConfigProvider: Send + Sync {
    fn version(&self) -> String;
    fn update_mode(&self) -> String;
    fn hash_algorithm(&self) -> String;
    fn file_base_url(&self) -> String;
    fn changelog(&self) -> Vec<String>;

    /// Changelog used when [`ConfigProvider::changelog`] is empty.
    fn changelog_placeholder(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub manifest: ManifestConfig,
    pub paths: PathsConfig,
    pub cache: CacheConfig,
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    pub version: String,
    pub update_mode: String,
    /// One of md5, sha1, sha256, blake3. Unknown names fall back to md5.
    pub hash_algorithm: String,
    /// Prefix for every file and archive URL; should end with `/`.
    pub file_base_url: String,
    pub changelog: Vec<String>,
    pub changelog_placeholder: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            update_mode: "hash".to_string(),
            hash_algorithm: "md5".to_string(),
            file_base_url: "http://localhost:8080/".to_string(),
            changelog: Vec::new(),
            changelog_placeholder: Vec::new(),
        }
    }
}

/// Locations, relative to the server root unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub public_dir: PathBuf,
    pub delete_list_dir: PathBuf,
    pub hash_cache_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            delete_list_dir: PathBuf::from("delete_list"),
            hash_cache_file: PathBuf::from("cache").join("dir_hashes.json"),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false every pass rebuilds every archive.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub compression: Compression,
    pub stream_threshold_mb: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            stream_threshold_mb: DEFAULT_STREAM_THRESHOLD / (1024 * 1024),
        }
    }
}

impl ArchiveConfig {
    pub fn builder(&self) -> ArchiveBuilder {
        ArchiveBuilder::new(
            self.compression,
            self.stream_threshold_mb.saturating_mul(1024 * 1024),
        )
    }
}

/// Absolute locations derived from a [`Config`] and a server root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub public_dir: PathBuf,
    pub delete_list_dir: PathBuf,
    pub hash_cache_file: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Resolve configured paths against the server root.
    pub fn layout(&self, root: &Path) -> Layout {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        Layout {
            public_dir: resolve(&self.paths.public_dir),
            delete_list_dir: resolve(&self.paths.delete_list_dir),
            hash_cache_file: resolve(&self.paths.hash_cache_file),
            log_file: self.paths.log_file.as_deref().map(resolve),
        }
    }
}

impl ConfigProvider for Config {
    fn version(&self) -> String {
        self.manifest.version.clone()
    }

    fn update_mode(&self) -> String {
        self.manifest.update_mode.clone()
    }

    fn hash_algorithm(&self) -> String {
        self.manifest.hash_algorithm.clone()
    }

    fn file_base_url(&self) -> String {
        self.manifest.file_base_url.clone()
    }

    fn changelog(&self) -> Vec<String> {
        self.manifest.changelog.clone()
    }

    fn changelog_placeholder(&self) -> Vec<String> {
        self.manifest.changelog_placeholder.clone()
    }
}
