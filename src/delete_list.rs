//! Client deletion lists
//!
//! Operators drop plain text files into the deletion-list directory, one
//! client-relative path per line. Every file is read and the lines are
//! concatenated as-is; duplicates across files are kept.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read every regular file in `dir`, in directory-iteration order.
///
/// Line terminators (`\n` or `\r\n`) are stripped and empty lines dropped;
/// nothing else is trimmed. A missing directory yields an empty list. A
/// file that cannot be read is logged and skipped.
pub fn read_delete_list(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read deletion list directory");
            return Vec::new();
        }
    };

    let mut list = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable deletion list entry");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }

        match read_list_file(&path) {
            Ok(lines) => {
                tracing::debug!(file = %path.display(), entries = lines.len(), "read deletion list");
                list.extend(lines);
            }
            Err(e) => tracing::warn!(error = %format!("{:#}", e), "skipping deletion list file"),
        }
    }

    tracing::info!(entries = list.len(), "deletion list assembled");
    list
}

/// Non-empty lines of one deletion list file, in order.
pub fn read_list_file(path: &Path) -> Result<Vec<String>> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read deletion list: {}", path.display()))?;
    Ok(parse_lines(&String::from_utf8_lossy(&bytes)))
}

fn parse_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blank_lines_and_empty_files_dropped() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "x\ny").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "").unwrap();

        assert_eq!(read_delete_list(temp_dir.path()), vec!["x", "y"]);
    }

    #[test]
    fn test_only_terminators_are_trimmed() {
        assert_eq!(
            parse_lines("  mods/old.jar \r\n\r\n\nconfig/x.cfg\n"),
            vec!["  mods/old.jar ", "config/x.cfg"]
        );
    }

    #[test]
    fn test_duplicates_across_files_are_kept() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one.txt"), "mods/a.jar\n").unwrap();
        fs::write(temp_dir.path().join("two.txt"), "mods/a.jar\n").unwrap();

        assert_eq!(read_delete_list(temp_dir.path()), vec!["mods/a.jar", "mods/a.jar"]);
    }

    #[test]
    fn test_subdirectories_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested").join("inner.txt"), "hidden").unwrap();
        fs::write(temp_dir.path().join("list.txt"), "shown").unwrap();

        assert_eq!(read_delete_list(temp_dir.path()), vec!["shown"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_delete_list(&temp_dir.path().join("delete_list")).is_empty());
    }
}
