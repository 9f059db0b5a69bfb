//! Error types shared by the filesystem layer and the zip reader.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors produced while reading the structure or contents of a zip archive.
#[derive(Debug, Error)]
pub enum ZipError {
    #[error("Not a valid ZIP file")]
    InvalidArchive,

    #[error("Invalid ZIP64 format")]
    InvalidZip64,

    #[error("Invalid Central Directory File Header")]
    InvalidCentralHeader,

    #[error("Invalid Local File Header")]
    InvalidLocalHeader,

    #[error("Entry data extends past the end of the archive: {0}")]
    TruncatedEntry(String),

    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    #[error("Encrypted entries are not supported: {0}")]
    Encrypted(String),

    #[error("Size mismatch for {name}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("Checksum mismatch for {name}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ZipError {
    /// The I/O error kind this failure is reported as.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Io(err) => err.kind(),
            Self::UnsupportedCompression(_) | Self::Encrypted(_) => io::ErrorKind::Unsupported,
            _ => io::ErrorKind::InvalidData,
        }
    }
}

/// A filesystem failure, carried as a canonical kind plus the original error.
///
/// The canonical kind is what callers branch on: `NotFound` means "does not
/// exist" and is the only value that lets the zip overlay take over. The
/// original error keeps whatever the underlying layer actually reported, so
/// "definitely absent" can be told apart from "present but broken".
///
/// Cloning is cheap, which lets cached failures be handed out again verbatim.
#[derive(Debug, Clone, Error)]
#[error("{original}")]
pub struct FsError {
    canonical: io::ErrorKind,
    original: Arc<io::Error>,
}

impl FsError {
    /// The "no such entry" error, with the same canonical and original kind.
    pub fn not_found() -> Self {
        Self {
            canonical: io::ErrorKind::NotFound,
            original: Arc::new(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    /// Wrap a host error, folding "not a directory" into not-found.
    ///
    /// A path like `a.zip/b` on disk fails with "not a directory" because
    /// `a.zip` is a file; for lookup purposes that is the same as absent.
    pub fn from_io(err: io::Error) -> Self {
        let canonical = match err.kind() {
            io::ErrorKind::NotADirectory => io::ErrorKind::NotFound,
            kind => kind,
        };
        Self {
            canonical,
            original: Arc::new(err),
        }
    }

    /// A mod key could not be produced because the file changed too recently.
    pub fn mod_key_unusable() -> Self {
        Self {
            canonical: io::ErrorKind::Other,
            original: Arc::new(io::Error::other("mod key unusable: file modified too recently")),
        }
    }

    pub fn canonical(&self) -> io::ErrorKind {
        self.canonical
    }

    pub fn original(&self) -> &io::Error {
        &self.original
    }

    pub fn is_not_found(&self) -> bool {
        self.canonical == io::ErrorKind::NotFound
    }
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        Self::from_io(err)
    }
}

impl From<ZipError> for FsError {
    fn from(err: ZipError) -> Self {
        match err {
            ZipError::Io(err) => Self::from_io(err),
            other => {
                let kind = other.kind();
                Self {
                    canonical: kind,
                    original: Arc::new(io::Error::new(kind, other)),
                }
            }
        }
    }
}
