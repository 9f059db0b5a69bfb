use flate2::read::DeflateDecoder;
use std::io::{self, Cursor, Read};
use std::sync::Arc;

use crate::error::ZipError;
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP entry reader
pub struct ZipExtractor {
    parser: ZipParser,
}

impl ZipExtractor {
    pub fn new(reader: Arc<dyn ReadAt>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>, ZipError> {
        self.parser.list_files().await
    }

    /// Open a decompression stream for an entry.
    ///
    /// Everything that can be rejected up front (encryption, compression
    /// method, a broken local header, a truncated data region) fails here.
    /// Size and checksum are verified by the stream once it reaches the end.
    pub async fn open(&self, entry: &ZipFileEntry) -> Result<EntryStream, ZipError> {
        if entry.is_encrypted() {
            return Err(ZipError::Encrypted(entry.file_name.clone()));
        }
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(ZipError::UnsupportedCompression(method));
        }

        let data_offset = self.parser.get_data_offset(entry).await?;

        let reader = self.parser.reader();
        let in_bounds = data_offset
            .checked_add(entry.compressed_size)
            .is_some_and(|end| end <= reader.size());
        let len = usize::try_from(entry.compressed_size)
            .ok()
            .filter(|_| in_bounds)
            .ok_or_else(|| ZipError::TruncatedEntry(entry.file_name.clone()))?;

        let mut compressed = vec![0u8; len];
        reader.read_exact_at(data_offset, &mut compressed).await?;

        let source = Cursor::new(compressed);
        let inner: Box<dyn Read + Send> = match entry.compression_method {
            CompressionMethod::Deflate => Box::new(DeflateDecoder::new(source)),
            _ => Box::new(source),
        };

        Ok(EntryStream {
            inner,
            hasher: crc32fast::Hasher::new(),
            name: entry.file_name.clone(),
            expected_crc: entry.crc32,
            expected_size: entry.uncompressed_size,
            read: 0,
        })
    }
}

/// Decompressed contents of one entry, checked against the central directory
pub struct EntryStream {
    inner: Box<dyn Read + Send>,
    hasher: crc32fast::Hasher,
    name: String,
    expected_crc: u32,
    expected_size: u64,
    read: u64,
}

impl EntryStream {
    fn verify(&self) -> Result<(), ZipError> {
        if self.read != self.expected_size {
            return Err(ZipError::SizeMismatch {
                name: self.name.clone(),
                expected: self.expected_size,
                actual: self.read,
            });
        }
        let actual = self.hasher.clone().finalize();
        if actual != self.expected_crc {
            return Err(ZipError::ChecksumMismatch {
                name: self.name.clone(),
                expected: self.expected_crc,
                actual,
            });
        }
        Ok(())
    }
}

impl Read for EntryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.verify()
                .map_err(|err| io::Error::new(err.kind(), err))?;
            return Ok(0);
        }
        self.read += n as u64;
        if self.read > self.expected_size {
            let err = ZipError::SizeMismatch {
                name: self.name.clone(),
                expected: self.expected_size,
                actual: self.read,
            };
            return Err(io::Error::new(err.kind(), err));
        }
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}
