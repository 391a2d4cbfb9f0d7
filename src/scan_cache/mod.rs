//! Change detection for directory archives
//!
//! Decides whether an archive built on a previous pass can be served again
//! by comparing a cheap path-list fingerprint against the value persisted
//! when the archive was last built.

pub mod decision;
pub mod fingerprint;
pub mod session;
pub mod store;

pub use decision::{decide, Decision, DirectoryState, RebuildReason};
pub use fingerprint::{fingerprint_dir, fingerprint_paths};
pub use session::{ScanSession, ScanStats};
pub use store::HashCache;
