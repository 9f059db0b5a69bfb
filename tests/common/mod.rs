#![allow(dead_code)]

use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use zip::CompressionMethod;
use zip::write::FileOptions;

/// Build an archive in memory. Names ending in `/` become directory entries.
pub fn build_zip(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    build_zip_with_comment(entries, method, "")
}

pub fn build_zip_with_comment(
    entries: &[(&str, &[u8])],
    method: CompressionMethod,
    comment: &str,
) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(method);
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
    }
    if !comment.is_empty() {
        writer.set_comment(comment);
    }
    writer.finish().unwrap().into_inner()
}

/// The `pkg.zip` layout: a nested file without an explicit directory entry
/// and a top-level readme
pub fn pkg_zip() -> Vec<u8> {
    build_zip(
        &[
            ("src/index.js", b"console.log('hi');\n"),
            ("README.md", b"# pkg\n"),
        ],
        CompressionMethod::Deflated,
    )
}

/// Find `needle` in `haystack`
pub fn position(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
        .unwrap()
}

/// Bytes in front of the first local header of a [`zip64_archive`], so the
/// header offset is never zero
pub const ZIP64_PREFIX: &[u8] = b"SFX!";

/// A ZIP64 extended information extra field (0x0001) holding `values`
pub fn zip64_extra(values: &[u64]) -> Vec<u8> {
    let mut field = Vec::new();
    field.write_u16::<LittleEndian>(0x0001).unwrap();
    field.write_u16::<LittleEndian>((values.len() * 8) as u16).unwrap();
    for value in values {
        field.write_u64::<LittleEndian>(*value).unwrap();
    }
    field
}

/// A hand-built archive holding one STORED entry, whose end record defers
/// to a ZIP64 record and locator.
///
/// With `saturate`, the central header reports its sizes and local header
/// offset as 0xFFFFFFFF and the real values must come from `extra`.
pub fn zip64_archive(name: &str, data: &[u8], saturate: bool, extra: &[u8]) -> Vec<u8> {
    let crc = crc32fast::hash(data);
    let mut out = ZIP64_PREFIX.to_vec();

    let lfh_offset = out.len() as u32;
    out.extend_from_slice(b"PK\x03\x04");
    out.write_u16::<LittleEndian>(45).unwrap(); // version needed
    out.write_u16::<LittleEndian>(0).unwrap(); // flags
    out.write_u16::<LittleEndian>(0).unwrap(); // stored
    out.write_u32::<LittleEndian>(0).unwrap(); // time and date
    out.write_u32::<LittleEndian>(crc).unwrap();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(data);

    let (size, offset) = if saturate {
        (u32::MAX, u32::MAX)
    } else {
        (data.len() as u32, lfh_offset)
    };
    let cd_offset = out.len() as u64;
    out.extend_from_slice(b"PK\x01\x02");
    out.write_u16::<LittleEndian>(45).unwrap(); // version made by
    out.write_u16::<LittleEndian>(45).unwrap(); // version needed
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(crc).unwrap();
    out.write_u32::<LittleEndian>(size).unwrap(); // compressed
    out.write_u32::<LittleEndian>(size).unwrap(); // uncompressed
    out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap(); // comment
    out.write_u16::<LittleEndian>(0).unwrap(); // disk
    out.write_u16::<LittleEndian>(0).unwrap(); // internal attributes
    out.write_u32::<LittleEndian>(0).unwrap(); // external attributes
    out.write_u32::<LittleEndian>(offset).unwrap();
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(extra);
    let cd_size = out.len() as u64 - cd_offset;

    let eocd64_offset = out.len() as u64;
    out.extend_from_slice(b"PK\x06\x06");
    out.write_u64::<LittleEndian>(44).unwrap();
    out.write_u16::<LittleEndian>(45).unwrap();
    out.write_u16::<LittleEndian>(45).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u64::<LittleEndian>(1).unwrap(); // entries on this disk
    out.write_u64::<LittleEndian>(1).unwrap(); // total entries
    out.write_u64::<LittleEndian>(cd_size).unwrap();
    out.write_u64::<LittleEndian>(cd_offset).unwrap();

    out.extend_from_slice(b"PK\x06\x07");
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
    out.write_u32::<LittleEndian>(1).unwrap();

    out.extend_from_slice(b"PK\x05\x06");
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0xFFFF).unwrap();
    out.write_u16::<LittleEndian>(0xFFFF).unwrap();
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out
}
