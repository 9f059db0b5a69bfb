use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::index::ZipIndex;
use crate::error::FsError;
use crate::fs::FileSystem;
use crate::zip::ZipExtractor;

/// Counters for the work the cache has actually done
#[derive(Debug, Default)]
pub struct CacheStats {
    pub(crate) archive_loads: AtomicU64,
    pub(crate) entry_reads: AtomicU64,
}

impl CacheStats {
    /// Number of times an archive was opened and indexed
    pub fn archive_loads(&self) -> u64 {
        self.archive_loads.load(Ordering::Relaxed)
    }

    /// Number of decompression attempts across all archives
    pub fn entry_reads(&self) -> u64 {
        self.entry_reads.load(Ordering::Relaxed)
    }
}

/// A cache slot. It is inserted before the load starts, so concurrent
/// callers find it and wait instead of loading a second time.
#[derive(Default)]
struct ArchiveSlot {
    index: OnceCell<Result<Arc<ZipIndex>, FsError>>,
}

/// Archive path to archive index, each loaded at most once.
///
/// Entries are never evicted, and a failed load stays failed.
#[derive(Default)]
pub struct ArchiveCache {
    archives: Mutex<HashMap<String, Arc<ArchiveSlot>>>,
    stats: Arc<CacheStats>,
}

impl ArchiveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index for `archive`, or `None` if it cannot be used
    pub async fn resolve(&self, fs: &dyn FileSystem, archive: &str) -> Option<Arc<ZipIndex>> {
        self.load(fs, archive).await.ok()
    }

    /// The index for `archive`, or the error that made it unusable.
    ///
    /// The first caller for a path loads it through `fs`; everyone else,
    /// concurrent or later, gets the same result. Slots are keyed by the
    /// absolute, cleaned path, so `/w/./pkg.zip` and `/w/pkg.zip` share one.
    pub async fn load(&self, fs: &dyn FileSystem, archive: &str) -> Result<Arc<ZipIndex>, FsError> {
        let key = fs.abs(archive).unwrap_or_else(|| archive.to_string());
        let slot = self.archives.lock().entry(key.clone()).or_default().clone();

        slot.index.get_or_init(|| self.open(fs, &key)).await.clone()
    }

    async fn open(&self, fs: &dyn FileSystem, archive: &str) -> Result<Arc<ZipIndex>, FsError> {
        self.stats.archive_loads.fetch_add(1, Ordering::Relaxed);

        let result = async {
            let reader = fs.open_file(archive).await?;
            let extractor = ZipExtractor::new(reader);
            let entries = extractor.list_files().await?;
            Ok::<_, FsError>(ZipIndex::build(
                archive,
                extractor,
                entries,
                self.stats.clone(),
            ))
        }
        .await;

        match result {
            Ok(index) => {
                debug!(
                    archive,
                    dirs = index.dir_count(),
                    files = index.file_count(),
                    "indexed zip archive"
                );
                Ok(Arc::new(index))
            }
            Err(err) if err.is_not_found() => {
                debug!(archive, "zip archive does not exist");
                Err(err)
            }
            Err(err) => {
                warn!(archive, error = %err, "failed to open zip archive");
                Err(err)
            }
        }
    }

    /// Whether a load for `archive` (an absolute, cleaned path) has been
    /// started
    pub fn contains(&self, archive: &str) -> bool {
        self.archives.lock().contains_key(archive)
    }

    /// The error recorded for `archive`, if its load finished and failed
    pub fn load_error(&self, archive: &str) -> Option<FsError> {
        let slot = self.archives.lock().get(archive)?.clone();
        slot.index.get()?.as_ref().err().cloned()
    }

    pub fn len(&self) -> usize {
        self.archives.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.lock().is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use std::io::{Cursor, Write};

    fn archive(names: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for name in names {
            writer.start_file(*name, options).unwrap();
            writer.write_all(name.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_loads_once() {
        let fs = Arc::new(MemoryFs::new().with_file("/w/pkg.zip", archive(&["a.txt", "b/c.txt"])));
        let cache = Arc::new(ArchiveCache::new());

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let fs = fs.clone();
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                cache.resolve(fs.as_ref(), "/w/pkg.zip").await.unwrap()
            }));
        }

        let mut indexes = Vec::new();
        for task in tasks {
            indexes.push(task.await.unwrap());
        }
        assert!(indexes.iter().all(|index| Arc::ptr_eq(index, &indexes[0])));
        assert_eq!(cache.stats().archive_loads(), 1);
        assert_eq!(fs.open_count("/w/pkg.zip"), 1);
        assert_eq!(indexes[0].file_count(), 2);
    }

    #[tokio::test]
    async fn failures_are_remembered() {
        let fs = MemoryFs::new().with_file("/w/bad.zip", "definitely not a zip");
        let cache = ArchiveCache::new();

        assert!(cache.resolve(&fs, "/w/bad.zip").await.is_none());
        assert!(cache.resolve(&fs, "/w/bad.zip").await.is_none());
        assert_eq!(fs.open_count("/w/bad.zip"), 1);
        assert_eq!(cache.stats().archive_loads(), 1);

        let err = cache.load_error("/w/bad.zip").unwrap();
        assert_eq!(err.canonical(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn missing_archives_are_remembered() {
        let fs = MemoryFs::new();
        let cache = ArchiveCache::new();

        assert!(cache.resolve(&fs, "/w/none.zip").await.is_none());
        assert!(cache.contains("/w/none.zip"));
        assert!(cache.load_error("/w/none.zip").unwrap().is_not_found());
        assert!(cache.resolve(&fs, "/w/none.zip").await.is_none());
        assert_eq!(fs.open_count("/w/none.zip"), 1);
    }

    #[tokio::test]
    async fn equivalent_spellings_share_a_slot() {
        let fs = MemoryFs::new().with_file("/w/pkg.zip", archive(&["a.txt"]));
        let cache = ArchiveCache::new();

        let first = cache.resolve(&fs, "/w/./pkg.zip").await.unwrap();
        let second = cache.resolve(&fs, "/w/sub/../pkg.zip").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("/w/pkg.zip"));
        assert_eq!(cache.stats().archive_loads(), 1);
        assert_eq!(fs.open_count("/w/pkg.zip"), 1);
    }
}
