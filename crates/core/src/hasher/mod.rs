use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

const CHUNK: usize = 64 * 1024;

/// Raw SHA-256 digest of a file, streamed in fixed-size chunks.
pub fn file_digest(path: &Path) -> io::Result<[u8; 32]> {
    let mut reader = BufReader::with_capacity(CHUNK, File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK];

    loop {
        match reader.read(&mut buf)? {
            0 => break,
            n => hasher.update(&buf[..n]),
        }
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    Ok(digest)
}

/// Whether an export target already holds exactly the source bytes.
/// Sizes are compared first so most mismatches never get hashed.
pub fn same_contents(source: &Path, target: &Path) -> io::Result<bool> {
    if std::fs::metadata(source)?.len() != std::fs::metadata(target)?.len() {
        return Ok(false);
    }
    Ok(file_digest(source)? == file_digest(target)?)
}
