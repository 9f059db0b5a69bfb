use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::{DirEntries, EntryKind, FileSystem, ModKey, WatchData, WatchState, path};
use crate::error::FsError;
use crate::io::{LocalFileReader, ReadAt};

/// A file modified more recently than this may still be changing
const MOD_KEY_SAFETY_GAP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default)]
pub struct RealFsOptions {
    /// Record a snapshot of every read for [`FileSystem::watch_data`]
    pub watch: bool,
    /// Working directory for relative paths; the process's own when unset
    pub working_dir: Option<String>,
}

/// The host disk
pub struct RealFs {
    cwd: Option<String>,
    watch: Option<Mutex<BTreeMap<String, WatchState>>>,
}

impl RealFs {
    pub fn new(options: RealFsOptions) -> Self {
        let cwd = match options.working_dir {
            Some(dir) => path::abs(&dir, None).or_else(|| {
                let process_cwd = std::env::current_dir().ok()?;
                path::abs(&dir, Some(&process_cwd.to_string_lossy()))
            }),
            None => std::env::current_dir()
                .ok()
                .map(|dir| path::clean(&dir.to_string_lossy())),
        };
        Self {
            cwd,
            watch: options.watch.then(|| Mutex::new(BTreeMap::new())),
        }
    }

    fn record(&self, path: &str, state: WatchState) {
        if let Some(watch) = &self.watch {
            watch.lock().insert(path.to_string(), state);
        }
    }

    fn record_failure(&self, path: &str, err: &FsError) {
        if err.is_not_found() {
            self.record(path, WatchState::Missing);
        }
    }
}

impl Default for RealFs {
    fn default() -> Self {
        Self::new(RealFsOptions::default())
    }
}

#[async_trait]
impl FileSystem for RealFs {
    async fn read_directory(&self, dir: &str) -> Result<Arc<DirEntries>, FsError> {
        let result = async {
            let mut read_dir = tokio::fs::read_dir(dir).await?;
            let mut entries = DirEntries::new(dir);
            while let Some(child) = read_dir.next_entry().await? {
                let name = child.file_name().to_string_lossy().into_owned();
                let file_type = child.file_type().await?;
                let kind = if file_type.is_symlink() {
                    // Links are listed as what they point at; dangling ones are skipped
                    match tokio::fs::metadata(child.path()).await {
                        Ok(meta) if meta.is_dir() => EntryKind::Dir,
                        Ok(_) => EntryKind::File,
                        Err(_) => continue,
                    }
                } else if file_type.is_dir() {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                };
                entries.insert(&name, kind);
            }
            Ok::<_, std::io::Error>(entries)
        }
        .await
        .map_err(FsError::from_io);

        match result {
            Ok(entries) => {
                let names = entries.sorted_keys().into_iter().map(str::to_string).collect();
                self.record(dir, WatchState::Dir(names));
                Ok(Arc::new(entries))
            }
            Err(err) => {
                self.record_failure(dir, &err);
                Err(err)
            }
        }
    }

    async fn read_file(&self, file: &str) -> Result<Arc<str>, FsError> {
        match tokio::fs::read_to_string(file).await {
            Ok(contents) => {
                let contents: Arc<str> = contents.into();
                self.record(file, WatchState::File(contents.clone()));
                Ok(contents)
            }
            Err(err) => {
                let err = FsError::from_io(err);
                self.record_failure(file, &err);
                Err(err)
            }
        }
    }

    async fn open_file(&self, file: &str) -> Result<Arc<dyn ReadAt>, FsError> {
        let reader = LocalFileReader::new(Path::new(file))?;
        Ok(Arc::new(reader))
    }

    async fn mod_key(&self, file: &str) -> Result<ModKey, FsError> {
        let meta = tokio::fs::metadata(file).await?;
        let modified = meta.modified()?;

        match SystemTime::now().duration_since(modified) {
            Ok(age) if age >= MOD_KEY_SAFETY_GAP => {}
            _ => return Err(FsError::mod_key_unusable()),
        }

        #[cfg(unix)]
        let (inode, mode) = {
            use std::os::unix::fs::MetadataExt;
            (meta.ino(), meta.mode())
        };
        #[cfg(not(unix))]
        let (inode, mode) = (0, 0);

        Ok(ModKey {
            size: meta.len(),
            modified,
            inode,
            mode,
        })
    }

    fn is_abs(&self, p: &str) -> bool {
        path::is_abs(p)
    }

    fn abs(&self, p: &str) -> Option<String> {
        path::abs(p, self.cwd.as_deref())
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
        self.cwd.clone().unwrap_or_default()
    }

    fn rel(&self, base: &str, target: &str) -> Option<String> {
        path::rel(base, target)
    }

    async fn kind(&self, dir: &str, base: &str) -> (Option<String>, Option<EntryKind>) {
        let entry_path = path::join(&[dir, base]);
        let Ok(meta) = tokio::fs::symlink_metadata(&entry_path).await else {
            return (None, None);
        };

        let mut symlink = None;
        let meta = if meta.file_type().is_symlink() {
            let Ok(target) = tokio::fs::canonicalize(&entry_path).await else {
                return (None, None);
            };
            let Ok(target_meta) = tokio::fs::metadata(&target).await else {
                return (None, None);
            };
            symlink = Some(target.to_string_lossy().into_owned());
            target_meta
        } else {
            meta
        };

        let kind = if meta.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        (symlink, Some(kind))
    }

    fn watch_data(&self) -> WatchData {
        match &self.watch {
            Some(watch) => WatchData {
                paths: watch.lock().clone(),
            },
            None => WatchData::default(),
        }
    }
}
