use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::hasher::HashAlgorithm;
use crate::logging;
use crate::output::{self, GenerateSummary, OutputMode};
use crate::progress;
use crate::scan_cache::fingerprint_dir;
use crate::service::ManifestService;
use crate::utils;

#[derive(Parser)]
#[command(name = "mcupdater")]
#[command(version)]
#[command(about = "Generate update manifests and directory archives for client distribution")]
#[command(long_about = "mcupdater scans a public content directory, packages each top-level \
    directory as a zip archive (reusing archives whose file list is unchanged) and writes \
    the manifest clients use to update.\n\n\
    Examples:\n  \
    mcupdater init --root /srv/updater            # Create layout and default config\n  \
    mcupdater generate --root /srv/updater -o /srv/updater/public/manifest.json\n  \
    mcupdater generate --json > manifest.json     # Print manifest to stdout\n  \
    mcupdater fingerprint public/mods             # Preview a directory fingerprint")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs to this file (overrides paths.log_file)
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the server directory layout and a default config
    Init {
        /// Server root [default: current directory]
        #[arg(long, value_name = "PATH")]
        root: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Scan the content directory and produce a manifest
    #[command(visible_alias = "g")]
    Generate {
        /// Server root [default: current directory]
        #[arg(long, value_name = "PATH")]
        root: Option<PathBuf>,

        /// Config file [default: <root>/config/updater.toml]
        #[arg(short = 'c', long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Write the manifest here instead of stdout
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the manifest JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the fingerprint of a directory
    #[command(visible_alias = "fp")]
    Fingerprint {
        /// Directory to fingerprint
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// md5, sha1, sha256 or blake3 [default: md5]
        #[arg(short = 'a', long, value_name = "NAME")]
        algorithm: Option<String>,
    },
}

/// What `init` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub created_dirs: Vec<PathBuf>,
    pub config_path: PathBuf,
    pub config_written: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn run(self) -> Result<()> {
        let output_mode = OutputMode::from_flags(self.quiet, self.verbose);

        match self.command {
            Commands::Init { root, force } => {
                logging::init(output_mode, self.log_file.as_deref())?;
                let root = resolve_root(root)?;
                let report = init_layout(&root, force)?;
                if output_mode != OutputMode::Quiet {
                    for dir in &report.created_dirs {
                        println!("created {}", utils::display_path(dir));
                    }
                    if report.config_written {
                        println!("wrote {}", utils::display_path(&report.config_path));
                    } else {
                        println!(
                            "kept existing {} (use --force to overwrite)",
                            utils::display_path(&report.config_path)
                        );
                    }
                }
                Ok(())
            }
            Commands::Generate {
                root,
                config,
                output: output_path,
                json,
            } => {
                let root = resolve_root(root)?;
                let (config, config_path, found) = load_config(&root, config)?;
                let layout = config.layout(&root);
                let log_file = self.log_file.clone().or_else(|| layout.log_file.clone());
                logging::init(output_mode, log_file.as_deref())?;
                if !found {
                    tracing::info!(
                        path = %config_path.display(),
                        "no config file, using defaults"
                    );
                }

                let service = ManifestService::from_config(config, &root);
                let spinner = progress::scan_spinner(
                    output_mode,
                    json || output_path.is_none(),
                    &format!("Scanning {}", layout.public_dir.display()),
                );
                let generation = service.refresh();
                progress::finish_and_clear(&spinner);

                match &output_path {
                    Some(path) => {
                        output::write_manifest(&generation.manifest, path)?;
                        tracing::info!(path = %path.display(), "manifest written");
                        if json {
                            output::print_json(&generation.manifest)?;
                        } else {
                            let summary =
                                GenerateSummary::from_generation(&generation, &layout.public_dir);
                            output::print_human(&summary, output_mode);
                        }
                    }
                    None => output::print_json(&generation.manifest)?,
                }
                Ok(())
            }
            Commands::Fingerprint { dir, algorithm } => {
                logging::init(output_mode, self.log_file.as_deref())?;
                let algorithm = algorithm
                    .as_deref()
                    .map(HashAlgorithm::resolve)
                    .unwrap_or_default();
                let (fingerprint, files) = fingerprint_dir(&dir, algorithm)
                    .with_context(|| format!("Failed to fingerprint {}", dir.display()))?;
                output::print_fingerprint(&dir, algorithm.name(), &fingerprint, files);
                Ok(())
            }
        }
    }
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Load the config for `root`. An explicit path must exist; the default
/// location falls back to built-in defaults when absent.
fn load_config(root: &Path, explicit: Option<PathBuf>) -> Result<(Config, PathBuf, bool)> {
    match explicit {
        Some(path) => Ok((Config::load(&path)?, path, true)),
        None => {
            let path = root.join(DEFAULT_CONFIG_PATH);
            if path.exists() {
                Ok((Config::load(&path)?, path, true))
            } else {
                Ok((Config::default(), path, false))
            }
        }
    }
}

/// Create the server layout under `root` and write the default config.
pub fn init_layout(root: &Path, force: bool) -> Result<InitReport> {
    let mut config = Config::default();
    config.paths.log_file = Some(PathBuf::from("logs").join("updater.log"));
    let layout = config.layout(root);
    let config_path = root.join(DEFAULT_CONFIG_PATH);

    let mut dirs = vec![
        layout.public_dir.clone(),
        layout.delete_list_dir.clone(),
    ];
    dirs.extend(layout.hash_cache_file.parent().map(Path::to_path_buf));
    dirs.extend(config_path.parent().map(Path::to_path_buf));
    dirs.extend(
        layout
            .log_file
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf),
    );

    let mut created_dirs = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            tracing::info!(dir = %dir.display(), "created directory");
            created_dirs.push(dir);
        }
    }

    let config_written = force || !config_path.exists();
    if config_written {
        config.save(&config_path)?;
    }

    Ok(InitReport {
        created_dirs,
        config_path,
        config_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let report = init_layout(root, false).unwrap();

        for dir in ["public", "delete_list", "cache", "config", "logs"] {
            assert!(root.join(dir).is_dir(), "{} missing", dir);
        }
        assert_eq!(report.created_dirs.len(), 5);
        assert!(report.config_written);
        let config = Config::load(&root.join(DEFAULT_CONFIG_PATH)).unwrap();
        assert_eq!(config.manifest.hash_algorithm, "md5");
        assert_eq!(config.paths.log_file, Some(PathBuf::from("logs/updater.log")));
    }

    #[test]
    fn test_init_keeps_existing_config_unless_forced() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let path = root.join(DEFAULT_CONFIG_PATH);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[manifest]\nversion = \"9.9.9\"\n").unwrap();

        let report = init_layout(root, false).unwrap();
        assert!(!report.config_written);
        assert_eq!(Config::load(&path).unwrap().manifest.version, "9.9.9");

        let report = init_layout(root, true).unwrap();
        assert!(report.config_written);
        assert_eq!(Config::load(&path).unwrap().manifest.version, "1.0.0");
    }

    #[test]
    fn test_load_config_defaults_when_absent() {
        let temp_dir = TempDir::new().unwrap();
        let (config, path, found) = load_config(temp_dir.path(), None).unwrap();
        assert!(!found);
        assert_eq!(config, Config::default());
        assert_eq!(path, temp_dir.path().join(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("other.toml");
        assert!(load_config(temp_dir.path(), Some(missing)).is_err());
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = <Cli as Parser>::try_parse_from([
            "mcupdater", "-vv", "generate", "--root", "/srv", "-o", "out.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate { root, output, json, .. } => {
                assert_eq!(root, Some(PathBuf::from("/srv")));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert!(!json);
            }
            _ => panic!("expected generate"),
        }
    }
}
