//! Directory archives
//!
//! Packages one directory subtree into a zip file. A build either produces a
//! complete archive at the destination or leaves nothing there at all.

use crate::error::ScanError;
use crate::utils::{self, SourceOpener};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Files at or above this size need zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

pub const DEFAULT_STREAM_THRESHOLD: u64 = 16 * 1024 * 1024; // 16MB

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// What went into a finished archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub entries: usize,
    /// Uncompressed bytes across all entries.
    pub bytes: u64,
}

#[derive(Clone)]
pub struct ArchiveBuilder {
    compression: Compression,
    /// Files at or above this size are streamed from disk instead of read
    /// into memory first.
    stream_threshold: u64,
    open: SourceOpener,
}

impl fmt::Debug for ArchiveBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveBuilder")
            .field("compression", &self.compression)
            .field("stream_threshold", &self.stream_threshold)
            .finish_non_exhaustive()
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new(Compression::default(), DEFAULT_STREAM_THRESHOLD)
    }
}

impl ArchiveBuilder {
    pub fn new(compression: Compression, stream_threshold: u64) -> Self {
        Self {
            compression,
            stream_threshold,
            open: utils::open_source,
        }
    }

    /// Read source files through `open` instead of [`File::open`].
    pub fn with_opener(mut self, open: SourceOpener) -> Self {
        self.open = open;
        self
    }

    /// Package every regular file under `source_dir` into `dest`.
    ///
    /// Entry names are paths relative to `source_dir` with `/` separators.
    /// The archive is written to a hidden `.<stem>.*.zip.mcupdater-partial`
    /// sibling and renamed over `dest` once complete, so readers never see a
    /// half-written file.
    /// On any failure the partial file and any previous `dest` are removed.
    pub fn build(&self, source_dir: &Path, dest: &Path) -> Result<ArchiveSummary, ScanError> {
        if !source_dir.is_dir() {
            return Err(ScanError::MissingSource {
                path: source_dir.to_path_buf(),
            });
        }

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| ScanError::archive(dest, e))?;

        let stem = dest
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (prefix, suffix) = utils::partial_archive_affixes(&stem);
        let partial = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(suffix)
            .tempfile_in(parent)
            .map_err(|e| ScanError::archive(dest, e))?;

        let summary = match self.write_archive(source_dir, partial.as_file()) {
            Ok(summary) => summary,
            Err(e) => {
                drop(partial);
                discard_destination(dest);
                return Err(ScanError::archive(dest, e));
            }
        };

        if let Err(e) = partial.persist(dest) {
            // Dropping the returned temp file removes it.
            drop(e.file);
            discard_destination(dest);
            return Err(ScanError::archive(dest, e.error));
        }

        tracing::info!(
            archive = %dest.display(),
            entries = summary.entries,
            bytes = summary.bytes,
            "archive built"
        );
        Ok(summary)
    }

    fn write_archive(&self, source_dir: &Path, out: &File) -> Result<ArchiveSummary, ZipError> {
        let mut zip = ZipWriter::new(BufWriter::new(out));
        let mut summary = ArchiveSummary::default();

        for entry in WalkDir::new(source_dir).min_depth(1) {
            let entry = entry.map_err(|e| ZipError::Io(e.into()))?;
            let is_file = entry.file_type().is_file()
                || (entry.file_type().is_symlink() && utils::is_regular_file(entry.path()));
            if !is_file {
                continue;
            }

            let name = utils::relative_slash_path(entry.path(), source_dir).ok_or_else(|| {
                ZipError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is outside {}", entry.path().display(), source_dir.display()),
                ))
            })?;

            match self.add_file(&mut zip, entry.path(), &name) {
                Ok(bytes) => {
                    summary.entries += 1;
                    summary.bytes += bytes;
                    tracing::trace!(entry = %name, bytes, "added to archive");
                }
                Err(e) => {
                    tracing::error!(entry = %name, error = %e, "failed to add file to archive");
                    return Err(e);
                }
            }
        }

        let writer = zip.finish()?;
        let file = writer.into_inner().map_err(|e| ZipError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(summary)
    }

    /// Add one file. The source handle is closed before this returns, on
    /// every path.
    fn add_file<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        path: &Path,
        name: &str,
    ) -> Result<u64, ZipError> {
        let mut file = (self.open)(path)?;
        let size = file.metadata()?.len();
        let options = self.entry_options(size);

        if size >= self.stream_threshold {
            zip.start_file(name, options)?;
            let copied = io::copy(&mut BufReader::new(file), zip)?;
            return Ok(copied);
        }

        let mut data = Vec::with_capacity(size as usize);
        file.read_to_end(&mut data)?;
        drop(file);

        zip.start_file(name, options)?;
        zip.write_all(&data)?;
        Ok(data.len() as u64)
    }

    fn entry_options(&self, size: u64) -> SimpleFileOptions {
        // A fixed timestamp keeps rebuilt archives byte-stable for the same input.
        SimpleFileOptions::default()
            .compression_method(self.compression.into())
            .last_modified_time(zip::DateTime::default())
            .large_file(size >= ZIP64_THRESHOLD)
    }
}

fn discard_destination(dest: &Path) {
    if let Err(e) = utils::remove_file_if_exists(dest) {
        tracing::error!(archive = %dest.display(), error = %e, "failed to remove stale archive");
    }
}
