use std::{fs::File, io::Read, path::Path};

use sha2::{Digest, Sha256};

/// Digest of a file plus the optional prefix captured while reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedContent {
    /// Lowercase hex SHA-256 of the whole file.
    pub digest: String,
    /// Up to the requested number of leading bytes; `None` when no capture was asked for.
    pub head: Option<Vec<u8>>,
}

/// Stream `path` through SHA-256 in 64 KiB chunks.
///
/// With `capture = Some(limit)` the first `limit` bytes are kept from the same
/// read, so the blob always matches the digest it is stored under.
pub fn hash_file(path: &Path, capture: Option<usize>) -> std::io::Result<HashedContent> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut head = capture.map(|limit| Vec::with_capacity(limit.min(64 * 1024)));
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        let chunk = &buffer[..read];
        hasher.update(chunk);
        if let (Some(head), Some(limit)) = (head.as_mut(), capture) {
            let room = limit.saturating_sub(head.len());
            head.extend_from_slice(&chunk[..room.min(chunk.len())]);
        }
    }
    Ok(HashedContent {
        digest: format!("{:x}", hasher.finalize()),
        head,
    })
}
