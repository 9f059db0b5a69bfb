//! Reading through zip archives as if they were directories.
//!
//! [`ZipFs`] wraps another [`FileSystem`]. Directory listings and file reads
//! go to the wrapped filesystem first; only when it reports that a path does
//! not exist does the overlay look for a `.zip/` in the path and try to serve
//! the request from inside that archive. Everything else is forwarded as is.

mod cache;
mod index;
mod resolve;

pub use cache::{ArchiveCache, CacheStats};
pub use index::ZipIndex;
pub use resolve::{ZipBoundary, split_zip_path};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::FsError;
use crate::fs::{DirEntries, EntryKind, FileSystem, ModKey, WatchData};
use crate::io::ReadAt;

/// A filesystem that can see inside zip archives
pub struct ZipFs<F> {
    inner: F,
    archives: ArchiveCache,
}

impl<F: FileSystem> ZipFs<F> {
    pub fn new(inner: F) -> Self {
        Self::with_cache(inner, ArchiveCache::new())
    }

    pub fn with_cache(inner: F, archives: ArchiveCache) -> Self {
        Self { inner, archives }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn archives(&self) -> &ArchiveCache {
        &self.archives
    }

    /// The archive `boundary` crosses into, with the path inside it
    async fn check_for_zip(&self, boundary: ZipBoundary) -> Option<(Arc<ZipIndex>, String)> {
        let index = self.archives.resolve(&self.inner, &boundary.archive).await?;
        Some((index, boundary.tail))
    }
}

#[async_trait]
impl<F: FileSystem> FileSystem for ZipFs<F> {
    async fn read_directory(&self, path: &str) -> Result<Arc<DirEntries>, FsError> {
        let not_found = match self.inner.read_directory(path).await {
            Err(err) if err.is_not_found() => err,
            result => return result,
        };

        let Some(boundary) = split_zip_path(path) else {
            return Err(not_found);
        };
        let Some((zip, tail)) = self.check_for_zip(boundary).await else {
            return Err(not_found);
        };
        zip.list(&tail, path).ok_or_else(FsError::not_found)
    }

    async fn read_file(&self, path: &str) -> Result<Arc<str>, FsError> {
        let not_found = match self.inner.read_file(path).await {
            Err(err) if err.is_not_found() => err,
            result => return result,
        };

        // The archive root is a directory, so a file path needs a tail
        let Some(boundary) = split_zip_path(path).filter(|b| !b.tail.is_empty()) else {
            return Err(not_found);
        };
        let Some((zip, tail)) = self.check_for_zip(boundary).await else {
            return Err(not_found);
        };
        zip.read(&tail).await.unwrap_or_else(|| Err(FsError::not_found()))
    }

    async fn open_file(&self, path: &str) -> Result<Arc<dyn ReadAt>, FsError> {
        self.inner.open_file(path).await
    }

    async fn mod_key(&self, path: &str) -> Result<ModKey, FsError> {
        self.inner.mod_key(path).await
    }

    fn is_abs(&self, path: &str) -> bool {
        self.inner.is_abs(path)
    }

    fn abs(&self, path: &str) -> Option<String> {
        self.inner.abs(path)
    }

    fn dir(&self, path: &str) -> String {
        self.inner.dir(path)
    }

    fn base(&self, path: &str) -> String {
        self.inner.base(path)
    }

    fn ext(&self, path: &str) -> String {
        self.inner.ext(path)
    }

    fn join(&self, parts: &[&str]) -> String {
        self.inner.join(parts)
    }

    fn cwd(&self) -> String {
        self.inner.cwd()
    }

    fn rel(&self, base: &str, target: &str) -> Option<String> {
        self.inner.rel(base, target)
    }

    async fn kind(&self, dir: &str, base: &str) -> (Option<String>, Option<EntryKind>) {
        self.inner.kind(dir, base).await
    }

    fn watch_data(&self) -> WatchData {
        self.inner.watch_data()
    }
}
