//! Shared path helpers
//!
//! Relative paths that end up in a manifest, a fingerprint, the hash cache,
//! or an archive entry name use `/` separators. Paths found on disk are
//! converted by [`relative_slash_path`]; paths built level by level during a
//! walk are joined with [`join_relative`].

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};

/// Suffix of in-progress archive files written by the archive builder.
pub const PARTIAL_ARCHIVE_SUFFIX: &str = ".zip.mcupdater-partial";

/// Opens a source file for reading. Hashing and archiving both go through
/// one of these so a caller can substitute its own.
pub type SourceOpener = fn(&Path) -> io::Result<File>;

/// The default [`SourceOpener`].
pub fn open_source(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// Name of the in-progress file for archive `<stem>.zip`, minus the random
/// part: `.<stem>.` and [`PARTIAL_ARCHIVE_SUFFIX`].
pub fn partial_archive_affixes(stem: &str) -> (String, &'static str) {
    (format!(".{}.", stem), PARTIAL_ARCHIVE_SUFFIX)
}

/// Directory stem of a leftover in-progress archive named
/// `.<stem>.<random>.zip.mcupdater-partial`, or `None` for any other name.
pub fn partial_archive_stem(name: &str) -> Option<&str> {
    let inner = name.strip_prefix('.')?.strip_suffix(PARTIAL_ARCHIVE_SUFFIX)?;
    let (stem, random) = inner.rsplit_once('.')?;
    let random_ok = !random.is_empty() && random.chars().all(|c| c.is_ascii_alphanumeric());
    if stem.is_empty() || !random_ok {
        return None;
    }
    Some(stem)
}

/// Render `path` relative to `base` with `/` separators.
///
/// Returns `None` when `path` is not under `base`. Non-UTF-8 components are
/// converted lossily.
pub fn relative_slash_path(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Join a manifest-relative path onto a parent prefix ("" at the root).
pub fn join_relative(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Normalize a path for display (forward slashes, no `./` prefix).
pub fn display_path(path: &Path) -> String {
    let path_str = path.to_string_lossy().replace('\\', "/");
    match path_str.strip_prefix("./") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => path_str,
    }
}

/// True for regular files, following symlinks like the content tree does.
///
/// A dangling link or a vanished entry counts as "not a file".
pub fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Remove a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_relative_slash_path_nested() {
        let base = PathBuf::from("public").join("mods");
        let path = base.join("sub").join("a.jar");
        assert_eq!(relative_slash_path(&path, &base).as_deref(), Some("sub/a.jar"));
    }

    #[test]
    fn test_relative_slash_path_outside_base() {
        assert_eq!(relative_slash_path(Path::new("/a/b"), Path::new("/c")), None);
        assert_eq!(relative_slash_path(Path::new("/a"), Path::new("/a")), None);
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(join_relative("", "mods"), "mods");
        assert_eq!(join_relative("mods", "a.jar"), "mods/a.jar");
    }

    #[test]
    fn test_partial_archive_stem() {
        assert_eq!(partial_archive_stem(".mods.a1B2c3.zip.mcupdater-partial"), Some("mods"));
        assert_eq!(
            partial_archive_stem(".my.pack.XyZ123.zip.mcupdater-partial"),
            Some("my.pack")
        );
        assert_eq!(partial_archive_stem("backup.zip.partial"), None);
        assert_eq!(partial_archive_stem("mods.a1B2c3.zip.mcupdater-partial"), None);
        assert_eq!(partial_archive_stem(".mods..zip.mcupdater-partial"), None);
        assert_eq!(partial_archive_stem(".mods.zip.mcupdater-partial"), None);
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(Path::new("./public")), "public");
        assert_eq!(display_path(Path::new("public/mods")), "public/mods");
    }

    #[test]
    fn test_remove_file_if_exists_tolerates_missing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.zip");
        assert!(remove_file_if_exists(&path).is_ok());

        fs::write(&path, b"x").unwrap();
        remove_file_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
