//! Error taxonomy for the scan/hash/cache/package pipeline
//!
//! Per-entry variants are recorded in the scan report and never abort a
//! pass. Only `RootUnreadable`, raised when the content root itself cannot
//! be listed, ends one with an empty result.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The path disappeared between listing and access.
    #[error("source vanished before it could be read: {}", path.display())]
    MissingSource { path: PathBuf },

    /// Reading a file's bytes for hashing failed.
    #[error("failed to hash {}: {source}", path.display())]
    HashCompute {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Opening, writing, or finalising an archive failed.
    #[error("failed to build archive {}: {source}", archive.display())]
    ArchiveBuild {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("hash cache I/O failed for {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("hash cache at {} is not a valid path-to-digest mapping: {source}", path.display())]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The content root itself could not be listed.
    #[error("cannot read scan root {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while reading `path` for hashing.
    ///
    /// `NotFound` means the entry vanished under us, which is reported as
    /// [`ScanError::MissingSource`] rather than a hashing failure.
    pub fn from_hash_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ScanError::MissingSource { path }
        } else {
            ScanError::HashCompute { path, source }
        }
    }

    pub fn archive(archive: impl Into<PathBuf>, source: impl Into<zip::result::ZipError>) -> Self {
        ScanError::ArchiveBuild {
            archive: archive.into(),
            source: source.into(),
        }
    }

    /// Short machine-friendly label used in summaries and JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::MissingSource { .. } => "missing_source",
            ScanError::HashCompute { .. } => "hash_compute",
            ScanError::ArchiveBuild { .. } => "archive_build",
            ScanError::CacheIo { .. } => "cache_io",
            ScanError::CacheFormat { .. } => "cache_format",
            ScanError::RootUnreadable { .. } => "root_unreadable",
            ScanError::Walk { .. } => "walk",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_becomes_missing_source() {
        let err = ScanError::from_hash_io(
            PathBuf::from("mods/a.jar"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::MissingSource { .. }));
        assert_eq!(err.kind(), "missing_source");
    }

    #[test]
    fn test_other_io_errors_are_hash_failures() {
        let err = ScanError::from_hash_io(
            PathBuf::from("mods/a.jar"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::HashCompute { .. }));
        assert!(err.to_string().contains("mods/a.jar"));
    }
}
