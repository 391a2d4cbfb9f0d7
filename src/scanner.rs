//! Content tree scanning
//!
//! Walks the public content root once per pass:
//! - loose files at the root become [`FileDescriptor`]s with a content hash
//! - each top-level directory is packaged as `<dir>.zip` next to it, reusing
//!   the archive from a previous pass when its fingerprint is unchanged
//!
//! Failures are per entry. A file or directory that cannot be processed is
//! logged, recorded in the [`ScanReport`], and left out of the output; the
//! rest of the tree is still scanned.

use crate::archive::ArchiveBuilder;
use crate::error::ScanError;
use crate::hasher::{self, HashAlgorithm};
use crate::manifest::{ContentEntry, DirectoryDescriptor, FileDescriptor, ScanOutput};
use crate::scan_cache::decision::short_hash;
use crate::scan_cache::{decide, fingerprint_paths, Decision, DirectoryState, HashCache, ScanStats};
use crate::utils::{self, SourceOpener};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Everything that went wrong during a pass, plus counters.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub stats: ScanStats,
    pub issues: Vec<ScanError>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub output: ScanOutput,
    pub report: ScanReport,
}

/// What happened to a directory's archive on this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveAction {
    Reused,
    Rebuilt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    /// `<name>.zip` next to a `<name>/` directory: one of our archives.
    ArchiveArtifact,
    /// Leftover temp file from an interrupted build.
    PartialArchive,
    /// Neither a regular file nor a directory.
    Special,
}

enum EntryOutcome {
    File(FileDescriptor),
    Directory {
        descriptor: DirectoryDescriptor,
        action: ArchiveAction,
        issues: Vec<ScanError>,
    },
    /// The archive could not be built; the directory is left out.
    DirectoryFailed { issues: Vec<ScanError> },
    Skipped(SkipReason),
    Failed(ScanError),
}

/// File listing of one archived directory.
///
/// Built level by level; each level returns its own listing and the parent
/// merges it, so nothing is shared between calls.
#[derive(Debug, Default)]
pub struct DirectoryListing {
    /// Files whose content could be hashed, sorted by path.
    pub contents: Vec<ContentEntry>,
    /// Every regular file found, hashed or not. Files that vanished before
    /// they could be opened are left out.
    pub paths: Vec<String>,
    pub issues: Vec<ScanError>,
}

impl DirectoryListing {
    fn merge(&mut self, other: DirectoryListing) {
        self.contents.extend(other.contents);
        self.paths.extend(other.paths);
        self.issues.extend(other.issues);
    }

    /// True when every subdirectory could be read. Entries that vanished
    /// mid-walk do not count against this; they are simply gone.
    pub fn traversal_complete(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|e| matches!(e, ScanError::RootUnreadable { .. } | ScanError::Walk { .. }))
    }

    /// True when every file found was also hashed.
    pub fn contents_complete(&self) -> bool {
        self.issues.is_empty()
    }

    /// Fingerprint of the listed paths, or `""` when the walk was incomplete.
    pub fn fingerprint(&self, algorithm: HashAlgorithm) -> String {
        if self.traversal_complete() {
            fingerprint_paths(&self.paths, algorithm)
        } else {
            String::new()
        }
    }
}

/// List and hash every regular file under `dir`.
///
/// Symlinks to files are included; symlinked directories are not descended
/// into, matching what ends up in the archive.
pub fn list_directory(dir: &Path, algorithm: HashAlgorithm) -> DirectoryListing {
    list_directory_with(dir, algorithm, utils::open_source)
}

fn list_directory_with(dir: &Path, algorithm: HashAlgorithm, open: SourceOpener) -> DirectoryListing {
    let mut listing = list_level(dir, "", algorithm, open);
    listing.contents.sort_by(|a, b| a.path.cmp(&b.path));
    listing
}

fn list_level(dir: &Path, prefix: &str, algorithm: HashAlgorithm, open: SourceOpener) -> DirectoryListing {
    let mut listing = DirectoryListing::default();

    let entries = match read_sorted_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            listing.issues.push(ScanError::MissingSource {
                path: dir.to_path_buf(),
            });
            return listing;
        }
        Err(source) => {
            listing.issues.push(ScanError::RootUnreadable {
                path: dir.to_path_buf(),
                source,
            });
            return listing;
        }
    };

    for (name, path) in entries {
        let rel = utils::join_relative(prefix, &name);
        let file_type = match fs::symlink_metadata(&path) {
            Ok(m) => m.file_type(),
            Err(e) => {
                listing.issues.push(ScanError::from_hash_io(path, e));
                continue;
            }
        };

        if file_type.is_dir() {
            listing.merge(list_level(&path, &rel, algorithm, open));
            continue;
        }
        if !(file_type.is_file() || (file_type.is_symlink() && utils::is_regular_file(&path))) {
            continue;
        }

        match open(&path).and_then(|file| hasher::hash_open_file(file, algorithm)) {
            Ok(hash) => {
                listing.paths.push(rel.clone());
                listing.contents.push(ContentEntry { path: rel, hash });
            }
            Err(e) => {
                let err = ScanError::from_hash_io(path, e);
                if !matches!(err, ScanError::MissingSource { .. }) {
                    listing.paths.push(rel);
                }
                listing.issues.push(err);
            }
        }
    }

    listing
}

/// Directory entries as `(name, path)`, sorted by name.
fn read_sorted_dir(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(entry) => entries.push((entry.file_name().to_string_lossy().into_owned(), entry.path())),
            Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry"),
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// One scan of a content root.
pub struct Scanner<'a> {
    root: PathBuf,
    base_url: String,
    algorithm: HashAlgorithm,
    builder: &'a ArchiveBuilder,
    open: SourceOpener,
}

impl<'a> Scanner<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
        algorithm: HashAlgorithm,
        builder: &'a ArchiveBuilder,
    ) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
            algorithm,
            builder,
            open: utils::open_source,
        }
    }

    /// Open content files for hashing through `open` instead of the filesystem.
    pub fn with_opener(mut self, open: SourceOpener) -> Self {
        self.open = open;
        self
    }

    /// Path of the archive for a top-level directory.
    pub fn archive_path(&self, rel: &str) -> PathBuf {
        self.root.join(format!("{}.zip", rel))
    }

    /// Scan the root, consulting and updating `cache`.
    ///
    /// The cache is only written for directories whose archive was confirmed
    /// or rebuilt successfully. Persisting it is left to the caller.
    pub fn scan(&self, cache: &mut HashCache) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        tracing::info!(root = %self.root.display(), algorithm = %self.algorithm, "scanning content root");

        let entries = match read_sorted_dir(&self.root) {
            Ok(entries) => entries,
            Err(source) => {
                let err = ScanError::RootUnreadable {
                    path: self.root.clone(),
                    source,
                };
                tracing::error!(error = %err, "scan aborted");
                outcome.report.issues.push(err);
                return outcome;
            }
        };

        for (name, path) in entries {
            let stats = &mut outcome.report.stats;
            match self.process_entry(&name, &path, cache) {
                EntryOutcome::File(descriptor) => {
                    stats.files += 1;
                    outcome.output.files.push(descriptor);
                }
                EntryOutcome::Directory {
                    descriptor,
                    action,
                    issues,
                } => {
                    stats.directories += 1;
                    match action {
                        ArchiveAction::Reused => stats.archives_reused += 1,
                        ArchiveAction::Rebuilt => stats.archives_rebuilt += 1,
                    }
                    outcome.output.directories.push(descriptor);
                    outcome.report.issues.extend(issues);
                }
                EntryOutcome::DirectoryFailed { issues } => {
                    stats.archives_failed += 1;
                    stats.skipped_entries += 1;
                    outcome.report.issues.extend(issues);
                }
                EntryOutcome::Skipped(SkipReason::ArchiveArtifact) => stats.skipped_artifacts += 1,
                EntryOutcome::Skipped(_) => {}
                EntryOutcome::Failed(err) => {
                    stats.skipped_entries += 1;
                    outcome.report.issues.push(err);
                }
            }
        }

        tracing::info!(
            files = outcome.report.stats.files,
            directories = outcome.report.stats.directories,
            reused = outcome.report.stats.archives_reused,
            rebuilt = outcome.report.stats.archives_rebuilt,
            failed = outcome.report.stats.archives_failed,
            issues = outcome.report.issues.len(),
            "scan finished"
        );
        outcome
    }

    fn process_entry(&self, name: &str, path: &Path, cache: &mut HashCache) -> EntryOutcome {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            // A failed rebuild earlier in this pass removes its own archive.
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.is_archive_artifact(path) => {
                return EntryOutcome::Skipped(SkipReason::ArchiveArtifact);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(entry = name, "entry vanished before it could be read, skipping");
                return EntryOutcome::Failed(ScanError::MissingSource {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                tracing::warn!(entry = name, error = %e, "cannot stat entry, skipping");
                return EntryOutcome::Failed(ScanError::from_hash_io(path.to_path_buf(), e));
            }
        };

        if metadata.is_dir() {
            return self.process_directory(name, path, cache);
        }
        if !metadata.is_file() {
            tracing::debug!(entry = name, "skipping special file");
            return EntryOutcome::Skipped(SkipReason::Special);
        }

        if self.is_partial_archive(name) {
            match utils::remove_file_if_exists(path) {
                Ok(()) => tracing::info!(entry = name, "removed leftover partial archive"),
                Err(e) => tracing::warn!(entry = name, error = %e, "cannot remove leftover partial archive"),
            }
            return EntryOutcome::Skipped(SkipReason::PartialArchive);
        }

        if self.is_archive_artifact(path) {
            tracing::debug!(entry = name, "skipping generated directory archive");
            return EntryOutcome::Skipped(SkipReason::ArchiveArtifact);
        }

        match (self.open)(path).and_then(|file| hasher::hash_open_file(file, self.algorithm)) {
            Ok(hash) => {
                tracing::debug!(file = name, hash = short_hash(&hash), "scanned file");
                EntryOutcome::File(FileDescriptor::new(
                    name.to_string(),
                    format!("{}{}", self.base_url, name),
                    hash,
                ))
            }
            Err(e) => {
                let err = ScanError::from_hash_io(path.to_path_buf(), e);
                tracing::error!(file = name, error = %err, "failed to hash file, skipping");
                EntryOutcome::Failed(err)
            }
        }
    }

    /// An in-progress archive left behind by an interrupted build of an
    /// existing top-level directory. Anything else is operator content.
    fn is_partial_archive(&self, name: &str) -> bool {
        utils::partial_archive_stem(name).is_some_and(|stem| self.root.join(stem).is_dir())
    }

    /// `foo.zip` with a sibling `foo/` directory is an archive we generated.
    fn is_archive_artifact(&self, path: &Path) -> bool {
        let is_zip = path
            .extension()
            .map(|ext| ext == "zip")
            .unwrap_or(false);
        if !is_zip {
            return false;
        }
        match (path.parent(), path.file_stem()) {
            (Some(parent), Some(stem)) => parent.join(stem).is_dir(),
            _ => false,
        }
    }

    fn process_directory(&self, rel: &str, path: &Path, cache: &mut HashCache) -> EntryOutcome {
        let listing = list_directory_with(path, self.algorithm, self.open);
        for issue in &listing.issues {
            tracing::warn!(directory = rel, error = %issue, "incomplete directory listing");
        }

        let fingerprint = listing.fingerprint(self.algorithm);
        let archive_path = self.archive_path(rel);
        let state = DirectoryState {
            fingerprint: &fingerprint,
            cached: cache.lookup(rel),
            archive_exists: archive_path.is_file(),
            contents_complete: listing.contents_complete(),
        };

        let action = match decide(state) {
            Decision::Reuse => {
                tracing::info!(
                    directory = rel,
                    fingerprint = short_hash(&fingerprint),
                    "directory unchanged, reusing archive"
                );
                cache.record(rel, &fingerprint);
                ArchiveAction::Reused
            }
            Decision::Rebuild(reason) => {
                tracing::info!(
                    directory = rel,
                    fingerprint = short_hash(&fingerprint),
                    %reason,
                    "rebuilding archive"
                );
                match self.builder.build(path, &archive_path) {
                    Ok(_) => {
                        cache.record(rel, &fingerprint);
                        ArchiveAction::Rebuilt
                    }
                    Err(err) => {
                        tracing::error!(directory = rel, error = %err, "archive build failed, leaving directory out");
                        let mut issues = listing.issues;
                        issues.push(err);
                        return EntryOutcome::DirectoryFailed { issues };
                    }
                }
            }
        };

        tracing::debug!(directory = rel, files = listing.contents.len(), "directory processed");
        EntryOutcome::Directory {
            descriptor: DirectoryDescriptor {
                path: rel.to_string(),
                url: format!("{}{}.zip", self.base_url, rel),
                hash: fingerprint,
                contents: listing.contents,
            },
            action,
            issues: listing.issues,
        }
    }
}

/// Scan `root` with a one-off [`Scanner`].
pub fn scan(
    root: &Path,
    base_url: &str,
    algorithm: HashAlgorithm,
    builder: &ArchiveBuilder,
    cache: &mut HashCache,
) -> ScanOutcome {
    Scanner::new(root, base_url, algorithm, builder).scan(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::digest;
    use std::time::SystemTime;
    use tempfile::TempDir;

    const BASE: &str = "http://host:8080/";

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn run(root: &Path, cache: &mut HashCache) -> ScanOutcome {
        scan(root, BASE, HashAlgorithm::Md5, &ArchiveBuilder::default(), cache)
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_end_to_end_first_and_second_pass() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "readme.txt", b"hi");
        write(root, "modpack/a.jar", b"jar");
        let mut cache = HashCache::in_memory();

        let first = run(root, &mut cache);
        assert!(first.report.is_clean());
        assert_eq!(
            first.output.files,
            vec![FileDescriptor::new(
                "readme.txt".to_string(),
                format!("{}readme.txt", BASE),
                digest(b"hi", HashAlgorithm::Md5),
            )]
        );

        let f1 = digest(b"a.jar", HashAlgorithm::Md5);
        let h1 = digest(b"jar", HashAlgorithm::Md5);
        assert_eq!(
            first.output.directories,
            vec![DirectoryDescriptor {
                path: "modpack".to_string(),
                url: format!("{}modpack.zip", BASE),
                hash: f1.clone(),
                contents: vec![ContentEntry {
                    path: "a.jar".to_string(),
                    hash: h1.clone(),
                }],
            }]
        );
        let archive = root.join("modpack.zip");
        assert!(archive.is_file());
        assert_eq!(first.report.stats.archives_rebuilt, 1);
        assert_eq!(cache.lookup("modpack"), f1);

        let bytes_before = fs::read(&archive).unwrap();
        let mtime_before = mtime(&archive);
        std::thread::sleep(std::time::Duration::from_millis(20));

        let second = run(root, &mut cache);
        assert_eq!(second.output, first.output);
        assert_eq!(second.report.stats.archives_reused, 1);
        assert_eq!(second.report.stats.archives_rebuilt, 0);
        assert_eq!(second.report.stats.skipped_artifacts, 1);
        assert_eq!(fs::read(&archive).unwrap(), bytes_before);
        assert_eq!(mtime(&archive), mtime_before);
    }

    #[test]
    fn test_added_file_triggers_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "mods/a.jar", b"a");
        let mut cache = HashCache::in_memory();
        let first = run(root, &mut cache);

        write(root, "mods/b.jar", b"b");
        let second = run(root, &mut cache);

        assert_eq!(second.report.stats.archives_rebuilt, 1);
        assert_ne!(first.output.directories[0].hash, second.output.directories[0].hash);
        assert_eq!(second.output.directories[0].contents.len(), 2);
        assert_eq!(cache.lookup("mods"), second.output.directories[0].hash);
    }

    #[test]
    fn test_content_only_change_reuses_archive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "mods/a.jar", b"v1");
        let mut cache = HashCache::in_memory();
        run(root, &mut cache);

        write(root, "mods/a.jar", b"v2");
        let second = run(root, &mut cache);

        // Fingerprints cover paths only, so the archive is kept while the
        // listed content hash reflects the new bytes.
        assert_eq!(second.report.stats.archives_reused, 1);
        assert_eq!(
            second.output.directories[0].contents[0].hash,
            digest(b"v2", HashAlgorithm::Md5)
        );
    }

    #[test]
    fn test_deleted_archive_is_rebuilt() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "mods/a.jar", b"a");
        let mut cache = HashCache::in_memory();
        run(root, &mut cache);

        fs::remove_file(root.join("mods.zip")).unwrap();
        let second = run(root, &mut cache);
        assert_eq!(second.report.stats.archives_rebuilt, 1);
        assert!(root.join("mods.zip").is_file());
    }

    #[test]
    fn test_unrelated_zip_is_published() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "resourcepack.zip", b"PK");
        let mut cache = HashCache::in_memory();

        let outcome = run(root, &mut cache);
        assert_eq!(outcome.output.files.len(), 1);
        assert_eq!(outcome.output.files[0].path, "resourcepack.zip");
    }

    #[test]
    fn test_nested_contents_use_forward_slashes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "config/ui/layout.json", b"{}");
        write(root, "config/settings.json", b"{}");
        let mut cache = HashCache::in_memory();

        let outcome = run(root, &mut cache);
        let paths: Vec<&str> = outcome.output.directories[0]
            .contents
            .iter()
            .map(|c| c.path.as_str())
            .collect();
        assert_eq!(paths, vec!["settings.json", "ui/layout.json"]);
        // Only top-level directories become archives.
        assert_eq!(outcome.output.directories.len(), 1);
        assert!(!root.join("config").join("ui.zip").exists());
    }

    #[test]
    fn test_leftover_partial_archive_is_cleaned() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "mods/a.jar", b"a");
        let leftover = root.join(".mods.abc123.zip.mcupdater-partial");
        fs::write(&leftover, b"half").unwrap();
        let mut cache = HashCache::in_memory();

        let outcome = run(root, &mut cache);
        assert!(!leftover.exists());
        assert!(outcome.output.files.is_empty());
        assert_eq!(outcome.output.directories.len(), 1);
    }

    #[test]
    fn test_operator_partial_named_file_is_published() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "mods/a.jar", b"a");
        write(root, "backup.zip.partial", b"operator content");
        // Our marker, but no matching directory.
        write(root, ".saves.abc123.zip.mcupdater-partial", b"kept");
        let mut cache = HashCache::in_memory();

        let outcome = run(root, &mut cache);
        assert!(root.join("backup.zip.partial").exists());
        assert!(root.join(".saves.abc123.zip.mcupdater-partial").exists());
        let names: Vec<&str> = outcome.output.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, vec![".saves.abc123.zip.mcupdater-partial", "backup.zip.partial"]);
        let backup = &outcome.output.files[1];
        assert_eq!(backup.hash, digest(b"operator content", HashAlgorithm::Md5));
    }

    #[test]
    fn test_unreadable_root_yields_empty_result() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = HashCache::in_memory();
        let outcome = run(&temp_dir.path().join("missing"), &mut cache);

        assert_eq!(outcome.output, ScanOutput::default());
        assert!(matches!(
            outcome.report.issues.as_slice(),
            [ScanError::RootUnreadable { .. }]
        ));
    }

    #[test]
    fn test_listing_fingerprint_matches_disk_fingerprint() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "a.jar", b"a");
        write(root, "a/b.jar", b"b");
        write(root, "z/y/x.cfg", b"x");

        let listing = list_directory(root, HashAlgorithm::Sha1);
        let (on_disk, count) =
            crate::scan_cache::fingerprint_dir(root, HashAlgorithm::Sha1).unwrap();
        assert_eq!(listing.fingerprint(HashAlgorithm::Sha1), on_disk);
        assert_eq!(count, 3);
    }

    fn deny_locked(path: &Path) -> io::Result<fs::File> {
        if path.file_name().is_some_and(|n| n == "locked.jar") {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"));
        }
        fs::File::open(path)
    }

    fn hide_ghost(path: &Path) -> io::Result<fs::File> {
        if path.file_name().is_some_and(|n| n == "ghost.jar") {
            return Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        }
        fs::File::open(path)
    }

    #[test]
    fn test_failed_build_keeps_cache_and_drops_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "mods/a.jar", b"a");
        write(root, "other/b.jar", b"b");
        write(root, "readme.txt", b"hi");
        let mut cache = HashCache::in_memory();
        let first = run(root, &mut cache);
        let cached = cache.lookup("mods").to_string();
        assert_eq!(first.output.directories.len(), 2);

        write(root, "mods/locked.jar", b"secret");
        let builder = ArchiveBuilder::default().with_opener(deny_locked);
        let second = Scanner::new(root, BASE, HashAlgorithm::Md5, &builder)
            .with_opener(deny_locked)
            .scan(&mut cache);

        assert_eq!(second.report.stats.archives_failed, 1);
        assert_eq!(cache.lookup("mods"), cached);
        assert!(!root.join("mods.zip").exists());
        let dirs: Vec<&str> = second.output.directories.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(dirs, vec!["other"]);
        assert_eq!(second.output.files.len(), 1);
        let issues = &second.report.issues;
        assert!(issues.iter().any(|e| matches!(e, ScanError::HashCompute { .. })));
        assert!(issues.iter().any(|e| matches!(e, ScanError::ArchiveBuild { .. })));
        let leftovers = fs::read_dir(root)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(utils::PARTIAL_ARCHIVE_SUFFIX))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_unhashable_file_forces_rebuild() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("mods");
        write(&dir, "a.jar", b"a");
        write(&dir, "locked.jar", b"secret");

        let listing = list_directory_with(&dir, HashAlgorithm::Md5, deny_locked);
        assert!(!listing.contents_complete());
        assert_eq!(listing.paths, vec!["a.jar", "locked.jar"]);
        let fingerprint = listing.fingerprint(HashAlgorithm::Md5);
        let state = DirectoryState {
            fingerprint: &fingerprint,
            cached: &fingerprint,
            archive_exists: true,
            contents_complete: listing.contents_complete(),
        };
        assert_eq!(
            decide(state),
            Decision::Rebuild(crate::scan_cache::RebuildReason::ContentsIncomplete)
        );
    }

    #[test]
    fn test_vanished_file_left_out_of_fingerprint() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("mods");
        write(&dir, "a.jar", b"a");
        write(&dir, "ghost.jar", b"boo");
        write(&dir, "sub/c.jar", b"c");

        let listing = list_directory_with(&dir, HashAlgorithm::Md5, hide_ghost);
        assert_eq!(listing.paths, vec!["a.jar", "sub/c.jar"]);
        assert_eq!(
            listing.fingerprint(HashAlgorithm::Md5),
            fingerprint_paths(&["a.jar", "sub/c.jar"], HashAlgorithm::Md5)
        );
        assert!(matches!(
            listing.issues.as_slice(),
            [ScanError::MissingSource { .. }]
        ));
    }
}
