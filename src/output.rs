use crate::manifest::UpdateManifest;
use crate::scanner::ScanReport;
use crate::service::Generation;
use crate::theme::Theme;
use crate::utils;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Only errors
    Normal,      // Standard output
    Verbose,     // Per-directory details
    VeryVerbose, // Every issue and content entry
}

impl OutputMode {
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose >= 2 {
            OutputMode::VeryVerbose
        } else if verbose == 1 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

/// One published archive, as reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveLine {
    pub path: String,
    pub files: usize,
    /// Size on disk; 0 when the archive could not be inspected.
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateSummary {
    pub version: String,
    pub files: usize,
    pub archives: Vec<ArchiveLine>,
    pub archive_bytes: u64,
    pub reused: usize,
    pub rebuilt: usize,
    pub failed: usize,
    pub delete_entries: usize,
    pub issues: Vec<String>,
    pub elapsed_ms: Option<i64>,
}

impl GenerateSummary {
    pub fn from_generation(generation: &Generation, public_dir: &Path) -> Self {
        let manifest = &generation.manifest;
        let archives: Vec<ArchiveLine> = manifest
            .directories
            .iter()
            .map(|dir| ArchiveLine {
                path: dir.path.clone(),
                files: dir.contents.len(),
                size_bytes: fs::metadata(public_dir.join(format!("{}.zip", dir.path)))
                    .map(|m| m.len())
                    .unwrap_or(0),
            })
            .collect();
        let stats = &generation.report.stats;

        Self {
            version: manifest.version.clone(),
            files: manifest.files.len(),
            archive_bytes: archives.iter().map(|a| a.size_bytes).sum(),
            archives,
            reused: stats.archives_reused,
            rebuilt: stats.archives_rebuilt,
            failed: stats.archives_failed,
            delete_entries: manifest.delete_list.len(),
            issues: issue_lines(&generation.report),
            elapsed_ms: generation.session.elapsed_ms(),
        }
    }
}

fn issue_lines(report: &ScanReport) -> Vec<String> {
    report
        .issues
        .iter()
        .map(|issue| format!("[{}] {}", issue.kind(), issue))
        .collect()
}

pub fn print_human(summary: &GenerateSummary, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!(
        "{}",
        Theme::header(&format!("Manifest {}", summary.version))
    );
    println!("{}", Theme::divider_bold(60));
    println!(
        "{:<18} {}",
        Theme::label("Loose files"),
        Theme::value(&summary.files.to_string())
    );
    println!(
        "{:<18} {} ({})",
        Theme::label("Archives"),
        Theme::value(&summary.archives.len().to_string()),
        Theme::size(&bytesize::to_string(summary.archive_bytes, true))
    );
    println!(
        "{:<18} {} reused, {} rebuilt, {} failed",
        Theme::label("Packaging"),
        Theme::value(&summary.reused.to_string()),
        Theme::value(&summary.rebuilt.to_string()),
        if summary.failed > 0 {
            Theme::error(&summary.failed.to_string())
        } else {
            Theme::value("0")
        }
    );
    println!(
        "{:<18} {}",
        Theme::label("Delete entries"),
        Theme::value(&summary.delete_entries.to_string())
    );

    if mode != OutputMode::Normal && !summary.archives.is_empty() {
        println!("{}", Theme::divider(60));
        for archive in &summary.archives {
            println!(
                "  {:<30} {:>6} files  {:>10}",
                archive.path,
                archive.files,
                Theme::size(&bytesize::to_string(archive.size_bytes, true))
            );
        }
    }

    println!("{}", Theme::divider(60));
    if summary.issues.is_empty() {
        println!("{}", Theme::success("No issues."));
    } else {
        println!(
            "{}",
            Theme::warning(&format!("{} issue(s) during scan", summary.issues.len()))
        );
        let show = match mode {
            OutputMode::VeryVerbose => summary.issues.len(),
            _ => summary.issues.len().min(5),
        };
        for issue in summary.issues.iter().take(show) {
            println!("  {}", Theme::muted(issue));
        }
        if summary.issues.len() > show {
            println!(
                "  {}",
                Theme::muted(&format!(
                    "... and {} more (use -vv to list all)",
                    summary.issues.len() - show
                ))
            );
        }
    }
    if let Some(ms) = summary.elapsed_ms {
        println!("{}", Theme::muted(&format!("Finished in {} ms", ms)));
    }
    println!();
}

/// Serialize a manifest the way clients receive it.
pub fn manifest_json(manifest: &UpdateManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("Failed to serialize manifest")
}

pub fn print_json(manifest: &UpdateManifest) -> Result<()> {
    println!("{}", manifest_json(manifest)?);
    Ok(())
}

/// Replace `path` with the manifest JSON without exposing a partial file.
pub fn write_manifest(manifest: &UpdateManifest, path: &Path) -> Result<()> {
    let json = manifest_json(manifest)?;
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            parent
        }
        None => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    temp.write_all(json.as_bytes())
        .and_then(|_| temp.write_all(b"\n"))
        .context("Failed to write manifest")?;
    temp.persist(path)
        .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
    Ok(())
}

pub fn print_fingerprint(dir: &Path, algorithm: &str, fingerprint: &str, files: usize) {
    println!("{}", fingerprint);
    eprintln!(
        "{} {} ({} files, {})",
        Theme::muted("fingerprint of"),
        utils::display_path(dir),
        files,
        algorithm
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{self, ManifestMetadata, ScanOutput};
    use tempfile::TempDir;

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(true, 2), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(false, 0), OutputMode::Normal);
        assert_eq!(OutputMode::from_flags(false, 1), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(false, 3), OutputMode::VeryVerbose);
    }

    #[test]
    fn test_summary_counts_archives() {
        use crate::config::Config;
        use crate::service::ManifestService;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("public").join("mods")).unwrap();
        fs::write(root.join("public").join("mods").join("a.jar"), b"jar").unwrap();
        fs::write(root.join("public").join("readme.txt"), b"hi").unwrap();

        let service = ManifestService::from_config(Config::default(), root);
        let generation = service.refresh();
        let summary = GenerateSummary::from_generation(&generation, &root.join("public"));

        assert_eq!(summary.version, "1.0.0");
        assert_eq!(summary.files, 1);
        assert_eq!(summary.rebuilt, 1);
        assert_eq!(summary.archives.len(), 1);
        assert_eq!(summary.archives[0].files, 1);
        assert!(summary.archive_bytes > 0);
        assert!(summary.issues.is_empty());
    }

    #[test]
    fn test_write_manifest_replaces_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("manifest.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale").unwrap();

        let manifest = manifest::assemble(
            ManifestMetadata {
                version: "3.1.0".to_string(),
                ..Default::default()
            },
            ScanOutput::default(),
            vec!["mods/old.jar".to_string()],
        );
        write_manifest(&manifest, &path).unwrap();

        let parsed: UpdateManifest =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, manifest);
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
