use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock};

use tokio::sync::OnceCell;
use tracing::warn;

use super::cache::CacheStats;
use crate::error::FsError;
use crate::fs::{DirEntries, EntryKind};
use crate::zip::{ZipExtractor, ZipFileEntry};

/// A directory inside an archive, explicit or implied by its contents
pub(crate) struct CompressedDir {
    /// Original-case path relative to the archive root
    path: String,
    /// Original-case child name to kind
    entries: HashMap<String, EntryKind>,
    /// Built on first listing
    listing: OnceLock<Arc<DirEntries>>,
}

impl CompressedDir {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            entries: HashMap::new(),
            listing: OnceLock::new(),
        }
    }
}

/// A file inside an archive.
///
/// The first read decompresses it and whatever came out, contents or error,
/// is what every later read sees.
pub(crate) struct CompressedFile {
    entry: ZipFileEntry,
    contents: OnceCell<Result<Arc<str>, FsError>>,
}

/// The index of one archive, keyed by lower-cased relative path
pub struct ZipIndex {
    path: String,
    extractor: ZipExtractor,
    dirs: HashMap<String, CompressedDir>,
    files: HashMap<String, CompressedFile>,
    stats: Arc<CacheStats>,
}

/// `"a/b/c"` to `("a/b", "c")`, `"c"` to `("", "c")`
fn split_dir(name: &str) -> (&str, &str) {
    match name.rfind('/') {
        Some(slash) => (&name[..slash], &name[slash + 1..]),
        None => ("", name),
    }
}

fn ensure_dir<'a>(
    dirs: &'a mut HashMap<String, CompressedDir>,
    dir_path: &str,
) -> &'a mut CompressedDir {
    dirs.entry(dir_path.to_lowercase())
        .or_insert_with(|| CompressedDir::new(dir_path))
}

fn build_tree(
    entries: Vec<ZipFileEntry>,
) -> (HashMap<String, CompressedDir>, HashMap<String, CompressedFile>) {
    let mut dirs = HashMap::new();
    let mut files = HashMap::new();
    ensure_dir(&mut dirs, "");

    for entry in entries {
        let name = entry
            .file_name
            .strip_suffix('/')
            .unwrap_or(&entry.file_name)
            .to_string();
        if name.is_empty() {
            continue;
        }

        if entry.is_directory {
            ensure_dir(&mut dirs, &name);
        } else {
            let (dir_path, base) = split_dir(&name);
            ensure_dir(&mut dirs, dir_path)
                .entries
                .insert(base.to_string(), EntryKind::File);
            files.insert(
                name.to_lowercase(),
                CompressedFile {
                    entry,
                    contents: OnceCell::new(),
                },
            );
        }
    }

    // Link every directory into its ancestors, creating the ones the
    // archive never listed explicitly
    let seeds: Vec<String> = dirs.values().map(|dir| dir.path.clone()).collect();
    for seed in seeds {
        let mut current = seed.as_str();
        while !current.is_empty() {
            let (parent, base) = split_dir(current);
            let previous = ensure_dir(&mut dirs, parent)
                .entries
                .insert(base.to_string(), EntryKind::Dir);
            if previous == Some(EntryKind::Dir) {
                // Already walked from here to the root
                break;
            }
            current = parent;
        }
    }

    (dirs, files)
}

impl ZipIndex {
    pub(crate) fn build(
        path: &str,
        extractor: ZipExtractor,
        entries: Vec<ZipFileEntry>,
        stats: Arc<CacheStats>,
    ) -> Self {
        let (dirs, files) = build_tree(entries);
        Self {
            path: path.to_string(),
            extractor,
            dirs,
            files,
            stats,
        }
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// List the directory at `tail`, or `None` if the archive has no such
    /// directory. Entries carry `request_path` as their parent.
    ///
    /// The listing is built once; every caller after the first shares it.
    pub fn list(&self, tail: &str, request_path: &str) -> Option<Arc<DirEntries>> {
        let dir = self.dirs.get(&tail.to_lowercase())?;
        let listing = dir.listing.get_or_init(|| {
            let mut listing = DirEntries::with_capacity(request_path, dir.entries.len());
            for (name, kind) in &dir.entries {
                listing.insert(name, *kind);
            }
            Arc::new(listing)
        });
        Some(listing.clone())
    }

    /// Read the file at `tail` as text, or `None` if the archive has no such
    /// file. Decompression happens at most once per file.
    pub async fn read(&self, tail: &str) -> Option<Result<Arc<str>, FsError>> {
        let file = self.files.get(&tail.to_lowercase())?;
        let result = file
            .contents
            .get_or_init(|| self.decompress(&file.entry))
            .await;
        Some(result.clone())
    }

    async fn decompress(&self, entry: &ZipFileEntry) -> Result<Arc<str>, FsError> {
        self.stats.entry_reads.fetch_add(1, Ordering::Relaxed);

        let result = async {
            let mut stream = self.extractor.open(entry).await?;
            let mut bytes = Vec::new();
            stream.read_to_end(&mut bytes)?;
            let text = String::from_utf8(bytes)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
            Ok::<_, FsError>(Arc::<str>::from(text))
        }
        .await;

        if let Err(err) = &result {
            warn!(
                archive = %self.path,
                entry = %entry.file_name,
                error = %err,
                "failed to read zip entry"
            );
        }
        result
    }
}
