use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use std::time::SystemTime;

use super::{DirEntries, EntryKind, FileSystem, ModKey, WatchData, path};
use crate::error::FsError;
use crate::io::{MemoryReader, ReadAt};

/// An in-memory filesystem.
///
/// Files are stored under absolute, cleaned paths. Directories exist
/// implicitly as the ancestors of files. Every `open_file` call is counted
/// per path, which makes archive opens observable.
pub struct MemoryFs {
    cwd: String,
    files: HashMap<String, Arc<[u8]>>,
    dirs: HashSet<String>,
    opens: Mutex<HashMap<String, usize>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        let root = path::clean(&std::path::MAIN_SEPARATOR.to_string());
        let mut dirs = HashSet::new();
        dirs.insert(root.clone());
        Self {
            cwd: root,
            files: HashMap::new(),
            dirs,
            opens: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_file(mut self, file: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert_file(file, contents);
        self
    }

    pub fn insert_file(&mut self, file: &str, contents: impl Into<Vec<u8>>) {
        let key = self.key(file);
        let mut parent = path::dir(&key);
        loop {
            if !self.dirs.insert(parent.clone()) {
                break;
            }
            let next = path::dir(&parent);
            if next == parent {
                break;
            }
            parent = next;
        }
        let bytes: Vec<u8> = contents.into();
        self.files.insert(key, bytes.into());
    }

    /// How many times `open_file` was called for `file`
    pub fn open_count(&self, file: &str) -> usize {
        let key = self.key(file);
        self.opens.lock().get(&key).copied().unwrap_or(0)
    }

    fn key(&self, p: &str) -> String {
        path::abs(p, Some(&self.cwd)).unwrap_or_else(|| path::clean(p))
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn read_directory(&self, dir: &str) -> Result<Arc<DirEntries>, FsError> {
        let key = self.key(dir);
        if self.files.contains_key(&key) {
            return Err(io::Error::from(io::ErrorKind::NotADirectory).into());
        }
        if !self.dirs.contains(&key) {
            return Err(io::Error::from(io::ErrorKind::NotFound).into());
        }

        let mut entries = DirEntries::new(dir);
        let children = self
            .files
            .keys()
            .map(|child| (child, EntryKind::File))
            .chain(self.dirs.iter().map(|child| (child, EntryKind::Dir)));
        for (child, kind) in children {
            if *child != key && path::dir(child) == key {
                entries.insert(&path::base(child), kind);
            }
        }
        Ok(Arc::new(entries))
    }

    async fn read_file(&self, file: &str) -> Result<Arc<str>, FsError> {
        let key = self.key(file);
        if self.dirs.contains(&key) {
            return Err(io::Error::from(io::ErrorKind::IsADirectory).into());
        }
        let Some(bytes) = self.files.get(&key) else {
            return Err(io::Error::from(io::ErrorKind::NotFound).into());
        };
        let text = std::str::from_utf8(bytes)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(text.into())
    }

    async fn open_file(&self, file: &str) -> Result<Arc<dyn ReadAt>, FsError> {
        let key = self.key(file);
        *self.opens.lock().entry(key.clone()).or_insert(0) += 1;
        match self.files.get(&key) {
            Some(bytes) => Ok(Arc::new(MemoryReader::new(bytes.clone()))),
            None if self.dirs.contains(&key) => {
                Err(io::Error::from(io::ErrorKind::IsADirectory).into())
            }
            None => Err(io::Error::from(io::ErrorKind::NotFound).into()),
        }
    }

    async fn mod_key(&self, file: &str) -> Result<ModKey, FsError> {
        let key = self.key(file);
        let Some(bytes) = self.files.get(&key) else {
            return Err(io::Error::from(io::ErrorKind::NotFound).into());
        };
        Ok(ModKey {
            size: bytes.len() as u64,
            modified: SystemTime::UNIX_EPOCH,
            inode: 0,
            mode: 0,
        })
    }

    fn is_abs(&self, p: &str) -> bool {
        path::is_abs(p)
    }

    fn abs(&self, p: &str) -> Option<String> {
        path::abs(p, Some(&self.cwd))
    }

    fn dir(&self, p: &str) -> String {
        path::dir(p)
    }

    fn base(&self, p: &str) -> String {
        path::base(p)
    }

    fn ext(&self, p: &str) -> String {
        path::ext(p)
    }

    fn join(&self, parts: &[&str]) -> String {
        path::join(parts)
    }

    fn cwd(&self) -> String {
        self.cwd.clone()
    }

    fn rel(&self, base: &str, target: &str) -> Option<String> {
        path::rel(base, target)
    }

    async fn kind(&self, dir: &str, base: &str) -> (Option<String>, Option<EntryKind>) {
        let key = self.key(&path::join(&[dir, base]));
        if self.dirs.contains(&key) {
            (None, Some(EntryKind::Dir))
        } else if self.files.contains_key(&key) {
            (None, Some(EntryKind::File))
        } else {
            (None, None)
        }
    }

    fn watch_data(&self) -> WatchData {
        WatchData::default()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sample() -> MemoryFs {
        MemoryFs::new()
            .with_file("/p/src/index.js", "export {}")
            .with_file("/p/README.md", "# readme")
    }

    #[tokio::test]
    async fn directories_are_implied_by_files() {
        let fs = sample();
        let listing = fs.read_directory("/p").await.unwrap();
        assert_eq!(listing.sorted_keys(), vec!["readme.md", "src"]);
        assert_eq!(listing.get("src").unwrap().kind(), EntryKind::Dir);

        let root = fs.read_directory("/").await.unwrap();
        assert_eq!(root.sorted_keys(), vec!["p"]);
    }

    #[tokio::test]
    async fn file_as_directory_behaves_like_the_disk() {
        let fs = sample();
        let err = fs.read_directory("/p/README.md").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.original().kind(), io::ErrorKind::NotADirectory);
    }

    #[tokio::test]
    async fn opens_are_counted_even_when_missing() {
        let fs = sample();
        assert!(fs.open_file("/p/none.zip").await.is_err());
        assert!(fs.open_file("/p/none.zip").await.is_err());
        fs.open_file("/p/README.md").await.unwrap();
        assert_eq!(fs.open_count("/p/none.zip"), 2);
        assert_eq!(fs.open_count("/p/README.md"), 1);
    }
}
