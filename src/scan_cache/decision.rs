//! Archive reuse policy

use std::fmt;

/// Outcome of comparing a directory's current state against the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The existing archive still matches; keep it untouched.
    Reuse,
    /// The archive has to be (re)built.
    Rebuild(RebuildReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildReason {
    /// No archive on disk.
    ArchiveMissing,
    /// The fingerprint could not be computed.
    FingerprintUnavailable,
    /// Some files could not be listed or hashed, so the directory counts as changed.
    ContentsIncomplete,
    /// Nothing cached for this directory yet.
    NotCached,
    /// The fingerprint differs from the cached one.
    Changed { previous: String },
}

/// Inputs to the reuse policy for one directory.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryState<'a> {
    pub fingerprint: &'a str,
    pub cached: &'a str,
    pub archive_exists: bool,
    pub contents_complete: bool,
}

/// Decide whether a directory's archive can be reused.
///
/// Reuse requires an existing archive, a non-empty fingerprint equal to the
/// cached one, and a complete content listing. Anything else rebuilds.
pub fn decide(state: DirectoryState<'_>) -> Decision {
    if !state.archive_exists {
        return Decision::Rebuild(RebuildReason::ArchiveMissing);
    }
    if state.fingerprint.is_empty() {
        return Decision::Rebuild(RebuildReason::FingerprintUnavailable);
    }
    if !state.contents_complete {
        return Decision::Rebuild(RebuildReason::ContentsIncomplete);
    }
    if state.cached.is_empty() {
        return Decision::Rebuild(RebuildReason::NotCached);
    }
    if state.fingerprint != state.cached {
        return Decision::Rebuild(RebuildReason::Changed {
            previous: state.cached.to_string(),
        });
    }
    Decision::Reuse
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildReason::ArchiveMissing => f.write_str("archive missing"),
            RebuildReason::FingerprintUnavailable => f.write_str("fingerprint unavailable"),
            RebuildReason::ContentsIncomplete => f.write_str("contents could not be fully read"),
            RebuildReason::NotCached => f.write_str("no cached fingerprint"),
            RebuildReason::Changed { previous } => {
                write!(f, "file list changed (was {})", short_hash(previous))
            }
        }
    }
}

/// First eight characters of a digest, for log lines.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
