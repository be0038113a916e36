use tracing::{debug, trace};

use crate::archive_common::{ArchiveDescriptor, CentralDirectoryEnd};
use crate::compression::{crc32, deflate_raw, CompressionMethod};
use crate::constants::{
    CENTRAL_DIRECTORY_ENTRY_BASE_SIZE, CENTRAL_DIRECTORY_ENTRY_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_SIZE, FILE_HEADER_BASE_SIZE, FIXED_EXTERNAL_FILE_ATTRIBUTES,
    FIXED_LAST_MOD_FILE_DATE, FIXED_LAST_MOD_FILE_TIME, GENERAL_PURPOSE_FLAGS,
    INTERNAL_FILE_ATTRIBUTES, LOCAL_FILE_HEADER_SIGNATURE, VERSION_MADE_BY, VERSION_NEEDED,
};
use crate::error::ArchiveError;
use crate::types::{ArchiveFileEntry, Payload};

/// Replace every `\` by `/`.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Checksum and compress one payload. `file_name` must already be normalized.
///
/// Entries are independent of each other, so this can run on any thread.
pub fn build_entry(file_name: &str, payload: &Payload) -> Result<ArchiveFileEntry, ArchiveError> {
    let file_name_as_bytes = file_name.as_bytes().to_vec();
    if file_name_as_bytes.len() > u16::MAX as usize {
        return Err(ArchiveError::FileNameTooLong {
            path: file_name.to_owned(),
            len: file_name_as_bytes.len(),
        });
    }

    let raw = payload.as_bytes();
    let uncompressed_size = size_field(file_name, raw.len())?;

    let crc32 = crc32(raw);
    let compressed = deflate_raw(raw)?;
    let compressed_size = size_field(file_name, compressed.len())?;

    trace!(
        file_name,
        crc32,
        uncompressed_size,
        compressed_size,
        "entry compressed"
    );

    Ok(ArchiveFileEntry {
        file_name_as_bytes,
        crc32,
        compressed_size,
        uncompressed_size,
        offset: 0,
        compressed,
    })
}

fn size_field(file_name: &str, size: usize) -> Result<u32, ArchiveError> {
    u32::try_from(size).map_err(|_| ArchiveError::EntryTooLarge {
        path: file_name.to_owned(),
        size: size as u64,
    })
}

pub fn build_file_header(archive_file_entry: &ArchiveFileEntry) -> ArchiveDescriptor {
    let mut file_header =
        ArchiveDescriptor::new(FILE_HEADER_BASE_SIZE + archive_file_entry.file_name_as_bytes.len());

    file_header.write_u32(LOCAL_FILE_HEADER_SIGNATURE);
    file_header.write_u16(VERSION_NEEDED);
    file_header.write_u16(GENERAL_PURPOSE_FLAGS);
    file_header.write_u16(CompressionMethod::Deflate().zip_code());
    file_header.write_u16(FIXED_LAST_MOD_FILE_TIME);
    file_header.write_u16(FIXED_LAST_MOD_FILE_DATE);
    file_header.write_u32(archive_file_entry.crc32);
    file_header.write_u32(archive_file_entry.compressed_size);
    file_header.write_u32(archive_file_entry.uncompressed_size);
    file_header.write_u16(archive_file_entry.file_name_len());
    file_header.write_u16(0); // extra field length
    file_header.write_bytes(&archive_file_entry.file_name_as_bytes);

    file_header
}

pub fn build_central_directory_file_header(
    central_directory_header: &mut ArchiveDescriptor,
    archive_file_entry: &ArchiveFileEntry,
) {
    central_directory_header.write_u32(CENTRAL_DIRECTORY_ENTRY_SIGNATURE);
    central_directory_header.write_u16(VERSION_MADE_BY);
    central_directory_header.write_u16(VERSION_NEEDED);
    central_directory_header.write_u16(GENERAL_PURPOSE_FLAGS);
    central_directory_header.write_u16(CompressionMethod::Deflate().zip_code());
    central_directory_header.write_u16(FIXED_LAST_MOD_FILE_TIME);
    central_directory_header.write_u16(FIXED_LAST_MOD_FILE_DATE);
    central_directory_header.write_u32(archive_file_entry.crc32);
    central_directory_header.write_u32(archive_file_entry.compressed_size);
    central_directory_header.write_u32(archive_file_entry.uncompressed_size);
    central_directory_header.write_u16(archive_file_entry.file_name_len());
    central_directory_header.write_u16(0); // extra field length
    central_directory_header.write_u16(0); // file comment length
    central_directory_header.write_u16(0); // disk number start
    central_directory_header.write_u16(INTERNAL_FILE_ATTRIBUTES);
    central_directory_header.write_u32(FIXED_EXTERNAL_FILE_ATTRIBUTES);
    central_directory_header.write_u32(archive_file_entry.offset);
    central_directory_header.write_bytes(&archive_file_entry.file_name_as_bytes);
}

/// Accumulator threaded through the entries, in archive order.
///
/// It owns the output and the running offset, so every build has its own.
#[derive(Debug, Default)]
pub struct ArchiveLayout {
    buffer: Vec<u8>,
    entries: Vec<ArchiveFileEntry>,
}

impl ArchiveLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the local header and payload of `archive_file_entry` at the current offset.
    pub fn append(mut self, mut archive_file_entry: ArchiveFileEntry) -> Result<Self, ArchiveError> {
        archive_file_entry.offset = u32::try_from(self.buffer.len()).map_err(|_| {
            ArchiveError::ArchiveTooLarge(format!(
                "local header of '{}' starts past 4 GiB",
                archive_file_entry.file_name()
            ))
        })?;

        let file_header = build_file_header(&archive_file_entry);
        self.buffer.extend_from_slice(file_header.buffer());
        self.buffer.extend_from_slice(&archive_file_entry.compressed);

        debug!(
            file_name = %archive_file_entry.file_name(),
            offset = archive_file_entry.offset,
            compressed_size = archive_file_entry.compressed_size,
            "local entry written"
        );

        // the central directory only needs the metadata
        archive_file_entry.compressed = Vec::new();
        self.entries.push(archive_file_entry);

        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the central directory and the end record, returning the complete archive.
    pub fn finish(mut self) -> Result<Vec<u8>, ArchiveError> {
        let number_of_entries = u16::try_from(self.entries.len()).map_err(|_| {
            ArchiveError::ArchiveTooLarge(format!("{} entries", self.entries.len()))
        })?;

        let central_directory_offset = u32::try_from(self.buffer.len()).map_err(|_| {
            ArchiveError::ArchiveTooLarge("central directory starts past 4 GiB".to_owned())
        })?;

        let central_directory_capacity: usize = self
            .entries
            .iter()
            .map(|entry| CENTRAL_DIRECTORY_ENTRY_BASE_SIZE + entry.file_name_as_bytes.len())
            .sum();
        let mut central_directory = ArchiveDescriptor::new(central_directory_capacity);

        let mut central_directory_records = 0usize;
        for archive_file_entry in &self.entries {
            build_central_directory_file_header(&mut central_directory, archive_file_entry);
            central_directory_records += 1;
        }
        debug_assert_eq!(central_directory_records, self.entries.len());
        debug_assert_eq!(central_directory.len(), central_directory_capacity);

        let central_directory_size = u32::try_from(central_directory.len()).map_err(|_| {
            ArchiveError::ArchiveTooLarge("central directory larger than 4 GiB".to_owned())
        })?;
        central_directory_offset
            .checked_add(central_directory_size)
            .ok_or_else(|| {
                ArchiveError::ArchiveTooLarge("central directory ends past 4 GiB".to_owned())
            })?;

        let central_directory_end = CentralDirectoryEnd::new(
            number_of_entries,
            central_directory_size,
            central_directory_offset,
        );
        let mut end_of_central_directory = ArchiveDescriptor::new(END_OF_CENTRAL_DIRECTORY_SIZE);
        central_directory_end.create_end_of_central_directory(&mut end_of_central_directory);

        self.buffer.reserve(central_directory.len() + end_of_central_directory.len());
        self.buffer.extend_from_slice(central_directory.buffer());
        self.buffer.extend_from_slice(end_of_central_directory.buffer());

        debug!(
            entries = number_of_entries,
            central_directory_offset,
            central_directory_size,
            archive_size = self.buffer.len(),
            "archive finalized"
        );

        Ok(self.buffer)
    }
}
