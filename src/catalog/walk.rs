use std::{
    fs::{self, DirEntry},
    path::{Path, PathBuf},
    vec,
};

use tracing::warn;

use super::errors::CatalogError;
use super::facts::extension_of;
use crate::settings::CatalogConfig;

/// Lazy depth-first walk over the regular files of a scan root.
///
/// Directories are entered as soon as they are met, before their later
/// siblings. Skipped directory names are pruned before descent. Symlinks and
/// other non-regular entries are never yielded or followed. Each directory is
/// read once, when the walk reaches it, and its entries are visited in name
/// order.
pub struct CatalogWalk<'a> {
    config: &'a CatalogConfig,
    stack: Vec<vec::IntoIter<DirEntry>>,
}

impl<'a> CatalogWalk<'a> {
    /// Start a walk at `config.scan_path`.
    ///
    /// Only the root is read eagerly; failing to read it is an error, while
    /// unreadable subdirectories are logged and skipped during iteration.
    pub fn new(config: &'a CatalogConfig) -> Result<Self, CatalogError> {
        let root = &config.scan_path;
        let entries = read_sorted(root).map_err(|source| CatalogError::ScanRoot {
            path: root.clone(),
            source,
        })?;
        Ok(Self {
            config,
            stack: vec![entries],
        })
    }

    fn enter(&mut self, dir: &Path) {
        match read_sorted(dir) {
            Ok(entries) => self.stack.push(entries),
            Err(err) => warn!(
                dir = %dir.display(),
                error = %err,
                "Failed to read directory during catalog scan"
            ),
        }
    }

    fn is_pruned(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.config.skips_dir(name))
    }
}

impl Iterator for CatalogWalk<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.stack.last_mut()?.next() {
                Some(entry) => entry,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "Failed to read file type during catalog scan"
                    );
                    continue;
                }
            };
            if file_type.is_symlink() {
                continue;
            }
            if file_type.is_dir() {
                if !self.is_pruned(&path) {
                    self.enter(&path);
                }
                continue;
            }
            if file_type.is_file() && self.config.allows_extension(&extension_of(&path)) {
                return Some(path);
            }
        }
    }
}

fn read_sorted(dir: &Path) -> std::io::Result<vec::IntoIter<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(err) => warn!(
                dir = %dir.display(),
                error = %err,
                "Failed to read directory entry during catalog scan"
            ),
        }
    }
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries.into_iter())
}
