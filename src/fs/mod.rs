//! The filesystem abstraction the zip overlay wraps.
//!
//! [`FileSystem`] is the full surface: two read operations that the overlay
//! extends into archives, and everything else (handles, mod keys, path math,
//! entry kinds, watch data) which it forwards untouched.

mod memory;
pub mod path;
mod real;

pub use memory::MemoryFs;
pub use real::{RealFs, RealFsOptions};

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::FsError;
use crate::io::ReadAt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    File,
    Dir,
}

/// One child of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    dir: String,
    base: String,
    kind: EntryKind,
}

impl Entry {
    pub fn new(dir: impl Into<String>, base: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
            kind,
        }
    }

    /// Path of the directory this entry was listed from
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Name with its original casing
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }
}

/// A directory listing keyed by lower-cased name.
///
/// Lookups are case-insensitive, while the entries keep the names as they
/// were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirEntries {
    dir: String,
    data: HashMap<String, Entry>,
}

impl DirEntries {
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            data: HashMap::new(),
        }
    }

    pub fn with_capacity(dir: impl Into<String>, capacity: usize) -> Self {
        Self {
            dir: dir.into(),
            data: HashMap::with_capacity(capacity),
        }
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Add a child named `base`. A later name that differs only in case wins.
    pub fn insert(&mut self, base: &str, kind: EntryKind) {
        self.data.insert(
            base.to_lowercase(),
            Entry::new(self.dir.clone(), base, kind),
        );
    }

    pub fn get(&self, query: &str) -> Option<&Entry> {
        self.data.get(&query.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lower-cased keys in sorted order
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.data.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Entries in the order of [`sorted_keys`](Self::sorted_keys)
    pub fn sorted_entries(&self) -> Vec<&Entry> {
        self.sorted_keys()
            .into_iter()
            .filter_map(|key| self.data.get(key))
            .collect()
    }
}

/// Identifies one version of a file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModKey {
    pub size: u64,
    pub modified: SystemTime,
    pub inode: u64,
    pub mode: u32,
}

/// What a watched path looked like when it was last read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Missing,
    /// Lower-cased child names, sorted
    Dir(Vec<String>),
    File(Arc<str>),
}

/// Snapshot of every path read while watching was enabled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchData {
    pub paths: BTreeMap<String, WatchState>,
}

/// A host filesystem.
///
/// Errors carry a canonical kind; `NotFound` is the one value that means
/// "this path does not exist" (see [`FsError::is_not_found`]).
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_directory(&self, path: &str) -> Result<Arc<DirEntries>, FsError>;

    async fn read_file(&self, path: &str) -> Result<Arc<str>, FsError>;

    /// Open a file for random access reads
    async fn open_file(&self, path: &str) -> Result<Arc<dyn ReadAt>, FsError>;

    async fn mod_key(&self, path: &str) -> Result<ModKey, FsError>;

    fn is_abs(&self, path: &str) -> bool;

    /// Absolute, cleaned form of `path`, if the working directory is known
    fn abs(&self, path: &str) -> Option<String>;

    fn dir(&self, path: &str) -> String;

    fn base(&self, path: &str) -> String;

    fn ext(&self, path: &str) -> String;

    fn join(&self, parts: &[&str]) -> String;

    fn cwd(&self) -> String;

    /// `target` relative to `base`, if one can be expressed
    fn rel(&self, base: &str, target: &str) -> Option<String>;

    /// Symlink target (if `base` is a link) and the kind it resolves to
    async fn kind(&self, dir: &str, base: &str) -> (Option<String>, Option<EntryKind>);

    fn watch_data(&self) -> WatchData;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case_but_names_keep_it() {
        let mut entries = DirEntries::new("/pkg");
        entries.insert("README.md", EntryKind::File);
        entries.insert("src", EntryKind::Dir);

        let readme = entries.get("readme.MD").unwrap();
        assert_eq!(readme.base(), "README.md");
        assert_eq!(readme.dir(), "/pkg");
        assert_eq!(entries.sorted_keys(), vec!["readme.md", "src"]);
    }
}
