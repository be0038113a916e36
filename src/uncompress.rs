//! Read the central directory of a Zip archive and extract single entries.
//!
//! Only what the locator and the round trip checks need is supported: single-disk archives,
//! stored or deflated entries, no ZIP64.
use std::fmt::{self, Debug, Display};
use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::NaiveDateTime;
use tracing::{trace, warn};

use crate::archive_common::{ArchiveDescriptorReader, CentralDirectoryEnd};
use crate::compression::{crc32, decompress, CompressionMethod};
use crate::constants::{
    CENTRAL_DIRECTORY_END_SIGNATURE, CENTRAL_DIRECTORY_ENTRY_BASE_SIZE,
    CENTRAL_DIRECTORY_ENTRY_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SIZE, FILE_HEADER_BASE_SIZE,
    LOCAL_FILE_HEADER_SIGNATURE, MAX_ARCHIVE_COMMENT_SIZE,
};
use crate::error::ArchiveError;
use crate::types::DosDateTime;

/// One central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub general_purpose_flags: u16,
    pub compression_method: u16,
    pub last_modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub internal_file_attributes: u16,
    pub external_file_attributes: u32,
    pub offset: u32,
}

impl ArchiveEntry {
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/') || self.name.ends_with('\\')
    }

    pub fn last_modified_time(&self) -> Option<NaiveDateTime> {
        self.last_modified.to_naive()
    }

    /// Unix permission bits stored in the high half of the external attributes, if any.
    pub fn unix_mode(&self) -> Option<u32> {
        match self.external_file_attributes >> 16 {
            0 => None,
            mode => Some(mode),
        }
    }

    fn pretty_version(zip_version: u16) -> (u16, u16) {
        let zip_version = zip_version & 0xFF;
        (zip_version / 10, zip_version % 10)
    }
}

impl Display for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let padding = 48;

        writeln!(f, "{: <padding$}{}", "file name:", self.name)?;
        writeln!(
            f,
            "{: <padding$}{}",
            "offset of local header from start of archive:", self.offset
        )?;

        let (major, minor) = ArchiveEntry::pretty_version(self.version_made_by);
        writeln!(
            f,
            "{: <padding$}{}.{} (host {})",
            "version of encoding software:",
            major,
            minor,
            self.version_made_by >> 8
        )?;

        let (major, minor) = ArchiveEntry::pretty_version(self.version_needed);
        writeln!(
            f,
            "{: <padding$}{}.{}",
            "minimum software version required to extract:", major, minor
        )?;

        writeln!(
            f,
            "{: <padding$}{:#018b}",
            "general purpose bit flag:", self.general_purpose_flags
        )?;

        let label = match CompressionMethod::from_compression_method(self.compression_method) {
            Ok(method) => method.label().to_owned(),
            Err(_) => format!("unknown ({})", self.compression_method),
        };
        writeln!(f, "{: <padding$}{}", "compression method:", label)?;

        writeln!(
            f,
            "{: <padding$}{}",
            "file last modified on (DOS date/time):", self.last_modified
        )?;
        writeln!(
            f,
            "{: <padding$}{:08x}",
            "32-bit CRC value (hex):", self.crc32
        )?;
        writeln!(
            f,
            "{: <padding$}{} bytes",
            "compressed size:", self.compressed_size
        )?;
        writeln!(
            f,
            "{: <padding$}{} bytes",
            "uncompressed size:", self.uncompressed_size
        )?;

        match self.unix_mode() {
            Some(mode) => writeln!(f, "{: <padding$}{:o}", "Unix file attributes:", mode),
            None => writeln!(f, "{: <padding$}none", "Unix file attributes:"),
        }
    }
}

/// The parsed central directory of an archive, and the source to extract entries from.
pub struct ArchiveReader<R>
where
    R: Read + Seek,
{
    reader: R,
    file_entries: Vec<ArchiveEntry>,
    central_directory_end: CentralDirectoryEnd,
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn new(mut reader: R) -> Result<ArchiveReader<R>, ArchiveError> {
        let (central_directory_end, file_entries) = Self::parse(&mut reader)?;

        Ok(ArchiveReader {
            reader,
            file_entries,
            central_directory_end,
        })
    }

    /// Every central directory record, in directory order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.file_entries
    }

    /// Names of the non-directory entries.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.file_entries
            .iter()
            .filter(|entry| !entry.is_dir())
            .map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.file_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_entries.is_empty()
    }

    pub fn central_directory_end(&self) -> &CentralDirectoryEnd {
        &self.central_directory_end
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decompress the entry called `name` and check its CRC-32.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let entry = self
            .file_entries
            .iter()
            .find(|entry| entry.name == name)
            .cloned()
            .ok_or_else(|| ArchiveError::EntryNotFound(name.to_owned()))?;

        let method = CompressionMethod::from_compression_method(entry.compression_method)?;

        self.reader.seek(SeekFrom::Start(entry.offset as u64))?;
        let signature = self.reader.read_u32::<LittleEndian>()?;
        if signature != LOCAL_FILE_HEADER_SIGNATURE {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "local header of '{}' not found at {}",
                name, entry.offset
            )));
        }

        // file name and extra field lengths are the last two fields of the local header
        self.reader.seek(SeekFrom::Start(
            entry.offset as u64 + FILE_HEADER_BASE_SIZE as u64 - 4,
        ))?;
        let file_name_len = self.reader.read_u16::<LittleEndian>()?;
        let extra_field_length = self.reader.read_u16::<LittleEndian>()?;
        self.reader.seek(SeekFrom::Current(
            file_name_len as i64 + extra_field_length as i64,
        ))?;

        // grows with the bytes actually present, not with the declared size
        let mut compressed = Vec::new();
        (&mut self.reader)
            .take(entry.compressed_size as u64)
            .read_to_end(&mut compressed)?;
        if compressed.len() != entry.compressed_size as usize {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "entry '{}' declares {} compressed bytes, only {} present",
                name,
                entry.compressed_size,
                compressed.len()
            )));
        }

        let data = decompress(method, &compressed, entry.uncompressed_size as usize)?;

        let actual = crc32(&data);
        if actual != entry.crc32 {
            return Err(ArchiveError::CrcMismatch {
                name: name.to_owned(),
                expected: entry.crc32,
                actual,
            });
        }
        if data.len() != entry.uncompressed_size as usize {
            warn!(
                name,
                declared = entry.uncompressed_size,
                actual = data.len(),
                "uncompressed size differs from the central directory"
            );
        }

        Ok(data)
    }

    fn parse(reader: &mut R) -> Result<(CentralDirectoryEnd, Vec<ArchiveEntry>), ArchiveError> {
        let file_length = reader.seek(SeekFrom::End(0))?;

        if file_length < END_OF_CENTRAL_DIRECTORY_SIZE as u64 {
            return Err(ArchiveError::BadArchiveStructure(
                "Archive too small".to_owned(),
            ));
        }

        // the end record is followed by at most a 65535 bytes comment
        let tail_length =
            file_length.min((END_OF_CENTRAL_DIRECTORY_SIZE + MAX_ARCHIVE_COMMENT_SIZE) as u64);
        let tail_start = file_length - tail_length;
        reader.seek(SeekFrom::Start(tail_start))?;

        let mut tail = vec![0; tail_length as usize];
        reader.read_exact(&mut tail)?;

        let (position, central_directory_end) = Self::find_central_directory_end(&tail)?;
        let central_directory_end_offset = tail_start + position as u64;
        trace!(central_directory_end_offset, "end of central directory found");

        let central_directory_start =
            central_directory_end.offset_of_start_of_central_directory as u64;
        let central_directory_size = central_directory_end.central_directory_size as u64;
        if central_directory_start + central_directory_size > central_directory_end_offset {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "central directory ({} bytes at {}) overlaps its end record at {}",
                central_directory_size, central_directory_start, central_directory_end_offset
            )));
        }

        reader.seek(SeekFrom::Start(central_directory_start))?;
        let mut central_directory_buffer = vec![0; central_directory_size as usize];
        reader.read_exact(&mut central_directory_buffer)?;

        let entries =
            Self::read_central_directory(&central_directory_end, &central_directory_buffer)?;

        Ok((central_directory_end, entries))
    }

    fn find_central_directory_end(
        tail: &[u8],
    ) -> Result<(usize, CentralDirectoryEnd), ArchiveError> {
        let last_candidate = tail.len() - END_OF_CENTRAL_DIRECTORY_SIZE;

        for position in (0..=last_candidate).rev() {
            let mut window = &tail[position..];
            if window.read_u32::<LittleEndian>()? != CENTRAL_DIRECTORY_END_SIGNATURE {
                continue;
            }

            match CentralDirectoryEnd::parse(&tail[position..]) {
                Ok(end)
                    if position + END_OF_CENTRAL_DIRECTORY_SIZE + end.archive_comment.len()
                        == tail.len() =>
                {
                    return Ok((position, end));
                }
                _ => trace!(position, "signature in payload or comment, skipped"),
            }
        }

        let signature = stringify!(CENTRAL_DIRECTORY_END_SIGNATURE);
        Err(ArchiveError::BadArchiveStructure(format!(
            "Signature {signature} Not found"
        )))
    }

    fn read_central_directory(
        central_directory_end: &CentralDirectoryEnd,
        central_directory_buffer: &[u8],
    ) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        if central_directory_end.number_of_this_disk != 0
            || central_directory_end.number_of_the_disk_with_central_directory != 0
        {
            return Err(ArchiveError::BadArchiveStructure(
                "multi-disk archives are not supported".to_owned(),
            ));
        }

        let expected = central_directory_end.total_number_of_entries_in_the_central_directory;
        let mut indexer = ArchiveDescriptorReader::new(central_directory_buffer);
        let mut entries: Vec<ArchiveEntry> = Vec::with_capacity(expected as usize);

        while indexer.remaining() >= CENTRAL_DIRECTORY_ENTRY_BASE_SIZE {
            let signature = indexer.read_u32()?;

            if signature != CENTRAL_DIRECTORY_ENTRY_SIGNATURE {
                return Err(ArchiveError::BadArchiveStructure(format!(
                    "Central directory signature not found at {}: I got {:#010x}, I expect {:#010x}",
                    indexer.get_index() - 4,
                    signature,
                    CENTRAL_DIRECTORY_ENTRY_SIGNATURE
                )));
            }

            let version_made_by = indexer.read_u16()?;
            let version_needed = indexer.read_u16()?;
            let general_purpose_flags = indexer.read_u16()?;
            let compression_method = indexer.read_u16()?;
            let last_mod_file_time = indexer.read_u16()?;
            let last_mod_file_date = indexer.read_u16()?;
            let crc32 = indexer.read_u32()?;
            let compressed_size = indexer.read_u32()?;
            let uncompressed_size = indexer.read_u32()?;
            let file_name_len = indexer.read_u16()?;
            let extra_field_length = indexer.read_u16()?;
            let file_comment_length = indexer.read_u16()?;
            let _file_disk_number = indexer.read_u16()?;
            let internal_file_attributes = indexer.read_u16()?;
            let external_file_attributes = indexer.read_u32()?;
            let offset = indexer.read_u32()?;
            let file_name_as_bytes = indexer.read_bytes(file_name_len as usize)?;
            indexer.skip(extra_field_length as usize + file_comment_length as usize)?;

            let entry = ArchiveEntry {
                name: String::from_utf8_lossy(file_name_as_bytes).into_owned(),
                version_made_by,
                version_needed,
                general_purpose_flags,
                compression_method,
                last_modified: DosDateTime::from_msdos(last_mod_file_date, last_mod_file_time),
                crc32,
                compressed_size,
                uncompressed_size,
                internal_file_attributes,
                external_file_attributes,
                offset,
            };

            trace!(name = %entry.name, offset, "central directory entry parsed");
            entries.push(entry);
        }

        if indexer.remaining() != 0 {
            warn!(
                trailing = indexer.remaining(),
                "unparsed bytes at the end of the central directory"
            );
        }

        if entries.len() != expected as usize {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "end record declares {} entries, the central directory holds {}",
                expected,
                entries.len()
            )));
        }

        Ok(entries)
    }
}

impl<R: Read + Seek> Debug for ArchiveReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("file_entries", &self.file_entries)
            .field("central_directory_end", &self.central_directory_end)
            .finish()
    }
}

impl<R: Read + Seek> Display for ArchiveReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let archive_comment = &self.central_directory_end.archive_comment;
        if archive_comment.is_empty() {
            writeln!(f, "There is no zipfile comment.")?;
        } else {
            writeln!(
                f,
                "The zipfile comment is {} bytes long and contains the following text:",
                archive_comment.len()
            )?;
            writeln!(f, "{}", String::from_utf8_lossy(archive_comment))?;
        }
        writeln!(f)?;

        for (i, entry) in self.file_entries.iter().enumerate() {
            writeln!(f, "Central directory entry #{}", i + 1)?;
            writeln!(f, "---------------------------")?;
            writeln!(f)?;
            writeln!(f, "{}", entry)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::constants::{FIXED_EXTERNAL_FILE_ATTRIBUTES, VERSION_MADE_BY, VERSION_NEEDED};
    use crate::create_predictable_zip;

    /// `short_text_file.txt` stored by a Unix archiver, `rw-r--r--`, dated 1980-01-01.
    const FOREIGN_ARCHIVE: [u8; 149] = [
        0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x21, 0x00, 0x81,
        0x3e, 0xfd, 0x9c, 0x0d, 0x00, 0x00, 0x00, 0x0d, 0x00, 0x00, 0x00, 0x13, 0x00, 0x00, 0x00,
        0x73, 0x68, 0x6f, 0x72, 0x74, 0x5f, 0x74, 0x65, 0x78, 0x74, 0x5f, 0x66, 0x69, 0x6c, 0x65,
        0x2e, 0x74, 0x78, 0x74, 0x73, 0x68, 0x6f, 0x72, 0x74, 0x20, 0x70, 0x61, 0x79, 0x6c, 0x6f,
        0x61, 0x64, 0x50, 0x4b, 0x01, 0x02, 0x2e, 0x03, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x21, 0x00, 0x81, 0x3e, 0xfd, 0x9c, 0x0d, 0x00, 0x00, 0x00, 0x0d, 0x00, 0x00, 0x00,
        0x13, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xa4, 0x81, 0x00,
        0x00, 0x00, 0x00, 0x73, 0x68, 0x6f, 0x72, 0x74, 0x5f, 0x74, 0x65, 0x78, 0x74, 0x5f, 0x66,
        0x69, 0x6c, 0x65, 0x2e, 0x74, 0x78, 0x74, 0x50, 0x4b, 0x05, 0x06, 0x00, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x41, 0x00, 0x00, 0x00, 0x3e, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn test_read_own_archive() -> Result<(), ArchiveError> {
        let bytes = create_predictable_zip([
            ("test.txt", "Hello World"),
            ("folder/nested.txt", "Nested content"),
        ])?;

        let mut archive = ArchiveReader::new(Cursor::new(bytes))?;
        assert_eq!(
            archive.file_names().collect::<Vec<_>>(),
            ["folder/nested.txt", "test.txt"]
        );

        let entry = &archive.entries()[1];
        assert_eq!(entry.version_made_by, VERSION_MADE_BY);
        assert_eq!(entry.version_needed, VERSION_NEEDED);
        assert_eq!(entry.external_file_attributes, FIXED_EXTERNAL_FILE_ATTRIBUTES);
        assert_eq!(entry.unix_mode(), Some(0o600));
        assert_eq!(entry.last_modified, DosDateTime::FIXED);

        assert_eq!(archive.read_entry("test.txt")?, b"Hello World");
        assert_eq!(archive.read_entry("folder/nested.txt")?, b"Nested content");
        Ok(())
    }

    #[test]
    fn test_read_foreign_stored_archive() -> Result<(), ArchiveError> {
        let mut archive = ArchiveReader::new(Cursor::new(FOREIGN_ARCHIVE.to_vec()))?;

        assert_eq!(archive.len(), 1);
        let entry = archive.entries()[0].clone();
        assert_eq!(entry.name, "short_text_file.txt");
        assert_eq!(entry.unix_mode(), Some(0o100644));

        assert_eq!(archive.read_entry(&entry.name)?, b"short payload");
        Ok(())
    }

    #[test]
    fn test_archive_comment_is_skipped() -> Result<(), ArchiveError> {
        let mut bytes = create_predictable_zip([("a.txt", "a")])?;
        let comment = b"PK\x05\x06 looks like a signature";
        let len = bytes.len();
        bytes[len - 2..].copy_from_slice(&(comment.len() as u16).to_le_bytes());
        bytes.extend_from_slice(comment);

        let archive = ArchiveReader::new(Cursor::new(bytes))?;
        assert_eq!(archive.central_directory_end().archive_comment, comment);
        assert_eq!(archive.file_names().collect::<Vec<_>>(), ["a.txt"]);
        Ok(())
    }

    #[test]
    fn test_empty_archive() -> Result<(), ArchiveError> {
        let bytes = create_predictable_zip(Vec::<(String, String)>::new())?;
        let archive = ArchiveReader::new(Cursor::new(bytes))?;

        assert!(archive.is_empty());
        assert_eq!(
            archive
                .central_directory_end()
                .total_number_of_entries_in_the_central_directory,
            0
        );
        Ok(())
    }

    #[test]
    fn test_not_an_archive() {
        let error = ArchiveReader::new(Cursor::new(vec![0u8; 100])).unwrap_err();
        assert!(matches!(error, ArchiveError::BadArchiveStructure(_)));

        let error = ArchiveReader::new(Cursor::new(vec![0x50, 0x4b])).unwrap_err();
        assert!(matches!(error, ArchiveError::BadArchiveStructure(_)));
    }

    #[test]
    fn test_corrupted_payload() -> Result<(), ArchiveError> {
        let mut bytes = create_predictable_zip([("a.bin", [7u8; 64])])?;
        // corrupt the crc of the central directory record
        let archive = ArchiveReader::new(Cursor::new(bytes.clone()))?;
        let central_directory_start = archive
            .central_directory_end()
            .offset_of_start_of_central_directory as usize;
        bytes[central_directory_start + 16] ^= 0xFF;

        let mut archive = ArchiveReader::new(Cursor::new(bytes))?;
        assert!(matches!(
            archive.read_entry("a.bin"),
            Err(ArchiveError::CrcMismatch { .. })
        ));
        assert!(matches!(
            archive.read_entry("b.bin"),
            Err(ArchiveError::EntryNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_oversized_compressed_size() -> Result<(), ArchiveError> {
        let mut bytes = FOREIGN_ARCHIVE.to_vec();
        // central directory at 0x3e, compressed size at +20
        bytes[0x3e + 20..0x3e + 24].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

        let mut archive = ArchiveReader::new(Cursor::new(bytes))?;
        assert_eq!(archive.entries()[0].compressed_size, 0xFFFF_FFF0);
        assert!(matches!(
            archive.read_entry("short_text_file.txt"),
            Err(ArchiveError::BadArchiveStructure(_))
        ));
        Ok(())
    }

    #[test]
    fn test_display_entry() -> Result<(), ArchiveError> {
        let bytes = create_predictable_zip([("a.txt", "a")])?;
        let archive = ArchiveReader::new(Cursor::new(bytes))?;

        let text = archive.to_string();
        assert!(text.contains(&format!("{: <48}a.txt", "file name:")));
        assert!(text.contains("2015-10-21 07:28:00"));
        assert!(text.contains("deflate"));
        Ok(())
    }
}
