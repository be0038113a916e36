#![allow(dead_code)]

use std::io::{Cursor, Read};

pub const NESTED_ARCHIVE_MD5: &str = "220f0d36a5150d3912a0eebee2738d80";
/// `a.txt` = "content a", `b.txt` = "content b".
pub const SORTED_ARCHIVE_MD5: &str = "5f3c72e2f32c5b7919cd6c31e5f169cd";
pub const BINARY_ARCHIVE_MD5: &str = "461a08dc38d2b7dae48c2bc2e641b958";
pub const EMPTY_ARCHIVE_MD5: &str = "76cdb2bad9582d23c1f6f4d868218d6c";

pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Payload spanning several deflate blocks.
pub fn big_payload() -> Vec<u8> {
    (0..100_000u32).map(|i| ((i * 7) % 251) as u8).collect()
}

/// Extract every entry with the `zip` crate, in central directory order.
pub fn unzip_all(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip_archive = zip::ZipArchive::new(Cursor::new(archive))
        .unwrap_or_else(|error| panic!("zip crate rejected the archive: {:?}", error));

    (0..zip_archive.len())
        .map(|index| {
            let mut file = zip_archive.by_index(index).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_owned(), data)
        })
        .collect()
}
