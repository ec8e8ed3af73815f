//! Artifact digests using blake3.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Hash a file's contents, streaming.
pub fn file_digest(path: &Path) -> io::Result<ContentHash> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(ContentHash(*hasher.finalize().as_bytes()))
}

/// Whether two files exist and hold identical bytes.
///
/// Any read error counts as "different".
pub fn same_content(a: &Path, b: &Path) -> bool {
    let (Ok(meta_a), Ok(meta_b)) = (a.metadata(), b.metadata()) else {
        return false;
    };
    if meta_a.len() != meta_b.len() {
        return false;
    }
    matches!((file_digest(a), file_digest(b)), (Ok(x), Ok(y)) if x == y)
}
