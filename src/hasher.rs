//! Content hashing
//!
//! A digest is always rendered as lowercase hex. The algorithm set is small
//! and fixed; see [`HashAlgorithm::resolve`] for how unknown names are
//! handled.

use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Files at or above this size are memory-mapped instead of read in chunks.
const MEMMAP_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB
const BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha1,
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Algorithm used whenever a requested name is not recognised.
    pub const DEFAULT: HashAlgorithm = HashAlgorithm::Md5;

    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Blake3,
    ];

    /// Strict lookup. Names are trimmed and compared case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(name))
    }

    /// Lenient lookup: an unknown name resolves to [`HashAlgorithm::DEFAULT`].
    ///
    /// The fallback is logged at `warn` with both names so a misconfigured
    /// algorithm shows up in the logs instead of silently changing digests.
    pub fn resolve(name: &str) -> Self {
        match Self::parse(name) {
            Some(alg) => alg,
            None => {
                tracing::warn!(
                    requested = name,
                    using = Self::DEFAULT.name(),
                    "unknown hash algorithm, falling back to default"
                );
                Self::DEFAULT
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    pub fn hasher(&self) -> ContentHasher {
        ContentHasher::new(*self)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental hasher over one of the supported algorithms.
pub enum ContentHasher {
    Md5(md5::Context),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl ContentHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => ContentHasher::Md5(md5::Context::new()),
            HashAlgorithm::Sha1 => ContentHasher::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => ContentHasher::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => ContentHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            ContentHasher::Md5(ctx) => ctx.consume(data),
            ContentHasher::Sha1(h) => h.update(data),
            ContentHasher::Sha256(h) => h.update(data),
            ContentHasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    pub fn finalize_hex(self) -> String {
        match self {
            ContentHasher::Md5(ctx) => format!("{:x}", ctx.compute()),
            ContentHasher::Sha1(h) => hex::encode(h.finalize()),
            ContentHasher::Sha256(h) => hex::encode(h.finalize()),
            ContentHasher::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Hex digest of an in-memory byte sequence.
pub fn digest(bytes: &[u8], algorithm: HashAlgorithm) -> String {
    let mut hasher = algorithm.hasher();
    hasher.update(bytes);
    hasher.finalize_hex()
}

/// Hex digest of everything readable from `reader`.
pub fn digest_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> io::Result<String> {
    let mut hasher = algorithm.hasher();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize_hex())
}

/// Hex digest of a file's content.
///
/// Large files are memory-mapped, smaller ones go through a buffered reader.
/// Both produce the same digest as [`digest`] over the file's bytes.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
    hash_open_file(File::open(path)?, algorithm)
}

/// Same as [`hash_file`] for a file that is already open.
pub fn hash_open_file(file: File, algorithm: HashAlgorithm) -> io::Result<String> {
    let file_size = file.metadata()?.len();

    if file_size >= MEMMAP_THRESHOLD {
        // Safety: the map is read-only and dropped before returning. A file
        // truncated concurrently by another process can still fault; content
        // roots are expected to be written by an operator, not live.
        let mmap = unsafe { memmap2::MmapOptions::new().map(&file)? };
        return Ok(digest(&mmap[..], algorithm));
    }

    digest_reader(BufReader::with_capacity(BUFFER_SIZE, file), algorithm)
}
