//! mcupdater library crate
//!
//! Scans a content tree, packages its top-level directories as zip archives
//! and assembles the update manifest clients download. The binary in
//! `main.rs` is a thin CLI over [`service::ManifestService`].

pub mod archive;
pub mod cli;
pub mod config;
pub mod delete_list;
pub mod error;
pub mod hasher;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod progress;
pub mod scan_cache;
pub mod scanner;
pub mod service;
pub mod theme;
pub mod utils;

pub use error::ScanError;
pub use manifest::UpdateManifest;
pub use service::ManifestService;
