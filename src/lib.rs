//! # zipfs
//!
//! A filesystem overlay that reads through paths inside zip archives.
//!
//! Asking the overlay for `/project/assets.zip/icons/logo.svg` returns the
//! contents of `icons/logo.svg` inside `assets.zip`, exactly as if the
//! archive had been extracted in place. Real files and directories always
//! win: the archive is only consulted when the wrapped filesystem reports
//! that a path does not exist.
//!
//! ## Features
//!
//! - Directory listings and whole-file text reads inside zip archives
//! - Case-insensitive lookups that keep the archive's original names
//! - Each archive is indexed once, on first use, even under concurrency
//! - Listings and file contents are materialized lazily and cached,
//!   failures included
//! - Support for ZIP64, STORED and DEFLATE, with CRC-32 verification
//!
//! ## Example
//!
//! ```no_run
//! use zipfs::{FileSystem, RealFs, ZipFs};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fs = ZipFs::new(RealFs::default());
//!
//!     let listing = fs.read_directory("vendor/pkg.zip/src").await?;
//!     for entry in listing.sorted_entries() {
//!         println!("{}", entry.base());
//!     }
//!
//!     let readme = fs.read_file("vendor/pkg.zip/README.md").await?;
//!     println!("{readme}");
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod fs;
pub mod io;
pub mod overlay;
pub mod zip;

pub use cli::Cli;
pub use error::{FsError, ZipError};
pub use fs::{
    DirEntries, Entry, EntryKind, FileSystem, MemoryFs, ModKey, RealFs, RealFsOptions, WatchData,
    WatchState,
};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use overlay::{ArchiveCache, CacheStats, ZipFs, ZipIndex};
pub use zip::{ZipExtractor, ZipFileEntry};
