//! Directory fingerprints
//!
//! A fingerprint covers the sorted list of relative file paths under a
//! directory and nothing else. File contents are deliberately left out, so
//! an edit that keeps every path the same does not change it.

use crate::error::ScanError;
use crate::hasher::HashAlgorithm;
use crate::utils;
use std::path::Path;
use walkdir::WalkDir;

/// Fingerprint of a set of `/`-separated relative paths.
///
/// The input order does not matter; paths are sorted before hashing.
pub fn fingerprint_paths<S: AsRef<str>>(paths: &[S], algorithm: HashAlgorithm) -> String {
    let mut sorted: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut hasher = algorithm.hasher();
    for path in sorted {
        hasher.update(path.as_bytes());
    }
    hasher.finalize_hex()
}

/// Relative paths of every regular file under `dir`, in walk order.
pub fn list_file_paths(dir: &Path) -> Result<Vec<String>, ScanError> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;

        let is_file = entry.file_type().is_file()
            || (entry.file_type().is_symlink() && utils::is_regular_file(entry.path()));
        if !is_file {
            continue;
        }

        if let Some(rel) = utils::relative_slash_path(entry.path(), dir) {
            paths.push(rel);
        }
    }

    Ok(paths)
}

/// Fingerprint a directory on disk.
///
/// Returns the fingerprint together with the number of files it covers.
pub fn fingerprint_dir(dir: &Path, algorithm: HashAlgorithm) -> Result<(String, usize), ScanError> {
    let paths = list_file_paths(dir)?;
    Ok((fingerprint_paths(&paths, algorithm), paths.len()))
}
