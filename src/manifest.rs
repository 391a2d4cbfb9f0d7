//! Update manifest document
//!
//! This is what clients download to decide which loose files and directory
//! archives to fetch and which local paths to delete.

use crate::config::ConfigProvider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A loose file served as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Forward-slash path relative to the content root
    pub path: String,
    pub url: String,
    /// Always `"file"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Content digest
    pub hash: String,
}

impl FileDescriptor {
    pub fn new(path: String, url: String, hash: String) -> Self {
        Self {
            path,
            url,
            kind: "file".to_string(),
            hash,
        }
    }
}

/// One file inside a directory archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Path relative to the archived directory
    pub path: String,
    /// Content digest
    pub hash: String,
}

/// A directory served as a single zip archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDescriptor {
    pub path: String,
    /// URL of the archive
    pub url: String,
    /// Path-list fingerprint the archive was built from
    pub hash: String,
    pub contents: Vec<ContentEntry>,
}

/// Files and directories found by one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutput {
    pub files: Vec<FileDescriptor>,
    pub directories: Vec<DirectoryDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifest {
    pub version: String,
    pub update_mode: String,
    /// Generation time, unix seconds
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub changelog: Vec<String>,
    pub files: Vec<FileDescriptor>,
    pub directories: Vec<DirectoryDescriptor>,
    pub delete_list: Vec<String>,
}

/// Scalar fields copied into the manifest verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestMetadata {
    pub version: String,
    pub update_mode: String,
    pub changelog: Vec<String>,
    /// Substituted for `changelog` when that is empty. Empty means no
    /// substitution.
    pub changelog_placeholder: Vec<String>,
}

impl ManifestMetadata {
    pub fn from_provider(provider: &dyn ConfigProvider) -> Self {
        Self {
            version: provider.version(),
            update_mode: provider.update_mode(),
            changelog: provider.changelog(),
            changelog_placeholder: provider.changelog_placeholder(),
        }
    }
}

/// Assemble a manifest stamped with the current time.
pub fn assemble(
    metadata: ManifestMetadata,
    scan: ScanOutput,
    delete_list: Vec<String>,
) -> UpdateManifest {
    assemble_at(metadata, scan, delete_list, Utc::now())
}

/// Assemble a manifest with an explicit timestamp.
pub fn assemble_at(
    metadata: ManifestMetadata,
    scan: ScanOutput,
    delete_list: Vec<String>,
    timestamp: DateTime<Utc>,
) -> UpdateManifest {
    let changelog = if metadata.changelog.is_empty() {
        metadata.changelog_placeholder
    } else {
        metadata.changelog
    };

    UpdateManifest {
        version: metadata.version,
        update_mode: metadata.update_mode,
        // Sub-second precision is not part of the document.
        timestamp: DateTime::from_timestamp(timestamp.timestamp(), 0).unwrap_or(timestamp),
        changelog,
        files: scan.files,
        directories: scan.directories,
        delete_list,
    }
}
