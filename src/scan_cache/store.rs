//! Persisted directory fingerprint cache
//!
//! The on-disk form is a single JSON object mapping a directory's relative
//! path to the fingerprint its archive was last built (or confirmed) from.

use crate::error::ScanError;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// In-memory view of the fingerprint cache.
///
/// Loading never fails: a missing or unreadable document yields an empty
/// cache, which the rebuild policy treats as "rebuild everything".
#[derive(Debug, Default)]
pub struct HashCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl HashCache {
    /// Load the cache document at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => {
                tracing::debug!(path = %path.display(), entries = entries.len(), "loaded hash cache");
                entries
            }
            Err(ScanError::CacheIo { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no hash cache yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable hash cache");
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path),
            entries,
        }
    }

    /// A cache that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Last recorded fingerprint for `dir`, or `""` when there is none.
    pub fn lookup(&self, dir: &str) -> &str {
        self.entries.get(dir).map(String::as_str).unwrap_or("")
    }

    /// Record the fingerprint an archive was built from or confirmed against.
    pub fn record(&mut self, dir: &str, fingerprint: &str) {
        self.entries.insert(dir.to_string(), fingerprint.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the current mapping back to disk.
    ///
    /// The document is written to a sibling temp file and renamed into
    /// place, so a crash mid-save leaves the previous document intact.
    /// In-memory caches are a no-op.
    pub fn save(&self) -> Result<(), ScanError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let io_err = |source: io::Error| ScanError::CacheIo {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(io_err)?;

        let json = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            ScanError::CacheFormat {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %path.display(), entries = self.entries.len(), "saved hash cache");
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, ScanError> {
    let raw = fs::read_to_string(path).map_err(|source| ScanError::CacheIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ScanError::CacheFormat {
        path: path.to_path_buf(),
        source,
    })
}
