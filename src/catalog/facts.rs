use std::{
    fs,
    io::{Error, ErrorKind},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

/// Cheap filesystem facts used to decide whether a file needs hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    /// Path as walked, used as the record key.
    pub path: String,
    pub extension: String,
    pub size_bytes: u64,
    /// Modification time truncated to whole unix seconds.
    pub mtime: i64,
}

/// Stat `path` without reading its content.
///
/// A path that is not valid UTF-8 has no exact text key and fails with
/// [`ErrorKind::InvalidData`].
pub fn read_facts(path: &Path) -> std::io::Result<FileFacts> {
    let key = path
        .to_str()
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, "path is not valid UTF-8"))?;
    let meta = fs::metadata(path)?;
    Ok(FileFacts {
        path: key.to_string(),
        extension: extension_of(path),
        size_bytes: meta.len(),
        mtime: unix_seconds(meta.modified()?),
    })
}

/// Lowercase extension without the leading dot; empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs().min(i64::MAX as u64) as i64,
        Err(err) => -(err.duration().as_secs().min(i64::MAX as u64) as i64),
    }
}
