use crate::constants::{
    CENTRAL_DIRECTORY_END_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SIZE, MAX_ARCHIVE_COMMENT_SIZE,
};
use crate::error::ArchiveError;

/// Append-only little-endian byte buffer used to pack Zip records.
#[derive(Debug)]
pub struct ArchiveDescriptor {
    buffer: Vec<u8>,
}

impl ArchiveDescriptor {
    pub fn new(capacity: usize) -> ArchiveDescriptor {
        ArchiveDescriptor {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u16(&mut self, val: u16) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u32(&mut self, val: u32) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_bytes(&mut self, val: &[u8]) {
        self.buffer.extend_from_slice(val);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

/// Cursor over a byte slice holding Zip records.
///
/// Reads past the end of the slice fail with [`ArchiveError::BadArchiveStructure`].
#[derive(Debug)]
pub struct ArchiveDescriptorReader<'a> {
    stream: &'a [u8],
    index: usize,
}

macro_rules! read_type {
    ($self:expr, $typ:ty) => {{
        const LEN: usize = ::std::mem::size_of::<$typ>();
        let bytes = $self.take(LEN, stringify!($typ))?;

        let mut read = [0u8; LEN];
        read.copy_from_slice(bytes);

        Ok(<$typ>::from_le_bytes(read))
    }};
}

impl<'a> ArchiveDescriptorReader<'a> {
    pub fn new(stream: &'a [u8]) -> ArchiveDescriptorReader<'a> {
        ArchiveDescriptorReader { stream, index: 0 }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.stream.len() - self.index
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], ArchiveError> {
        let upper_bound = self
            .index
            .checked_add(len)
            .filter(|upper_bound| *upper_bound <= self.stream.len())
            .ok_or_else(|| {
                ArchiveError::BadArchiveStructure(format!(
                    "truncated record: reading {} ({} bytes) at {} of a {} bytes array",
                    what,
                    len,
                    self.index,
                    self.stream.len()
                ))
            })?;

        let value = &self.stream[self.index..upper_bound];
        self.index = upper_bound;

        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16, ArchiveError> {
        read_type!(self, u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, ArchiveError> {
        read_type!(self, u32)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ArchiveError> {
        self.take(len, "bytes")
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ArchiveError> {
        self.take(len, "skipped bytes").map(|_| ())
    }
}

/// End of central directory record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CentralDirectoryEnd {
    pub number_of_this_disk: u16,
    pub number_of_the_disk_with_central_directory: u16,
    pub total_number_of_entries_on_this_disk: u16,
    pub total_number_of_entries_in_the_central_directory: u16,
    pub central_directory_size: u32,
    pub offset_of_start_of_central_directory: u32,
    pub archive_comment: Vec<u8>,
}

impl CentralDirectoryEnd {
    /// The record of a single-disk archive without comment.
    pub fn new(number_of_entries: u16, central_directory_size: u32, offset: u32) -> Self {
        Self {
            number_of_this_disk: 0,
            number_of_the_disk_with_central_directory: 0,
            total_number_of_entries_on_this_disk: number_of_entries,
            total_number_of_entries_in_the_central_directory: number_of_entries,
            central_directory_size,
            offset_of_start_of_central_directory: offset,
            archive_comment: Vec::new(),
        }
    }

    pub fn zip_file_comment_length(&self) -> u16 {
        self.archive_comment.len().min(MAX_ARCHIVE_COMMENT_SIZE) as u16
    }

    pub fn create_end_of_central_directory(
        &self,
        end_of_central_directory: &mut ArchiveDescriptor,
    ) {
        let comment_length = self.zip_file_comment_length();

        end_of_central_directory.write_u32(CENTRAL_DIRECTORY_END_SIGNATURE);
        end_of_central_directory.write_u16(self.number_of_this_disk);
        end_of_central_directory.write_u16(self.number_of_the_disk_with_central_directory);
        end_of_central_directory.write_u16(self.total_number_of_entries_on_this_disk);
        end_of_central_directory.write_u16(self.total_number_of_entries_in_the_central_directory);
        end_of_central_directory.write_u32(self.central_directory_size);
        end_of_central_directory.write_u32(self.offset_of_start_of_central_directory);
        end_of_central_directory.write_u16(comment_length);
        end_of_central_directory.write_bytes(&self.archive_comment[..comment_length as usize]);
    }

    /// Parse a record starting at its signature.
    pub fn parse(stream: &[u8]) -> Result<Self, ArchiveError> {
        if stream.len() < END_OF_CENTRAL_DIRECTORY_SIZE {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "end of central directory record is {} bytes, expected at least {}",
                stream.len(),
                END_OF_CENTRAL_DIRECTORY_SIZE
            )));
        }

        let mut indexer = ArchiveDescriptorReader::new(stream);

        let signature = indexer.read_u32()?;
        if signature != CENTRAL_DIRECTORY_END_SIGNATURE {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "I got {:#010x}, I expect {:#010x}",
                signature, CENTRAL_DIRECTORY_END_SIGNATURE
            )));
        }

        let number_of_this_disk = indexer.read_u16()?;
        let number_of_the_disk_with_central_directory = indexer.read_u16()?;
        let total_number_of_entries_on_this_disk = indexer.read_u16()?;
        let total_number_of_entries_in_the_central_directory = indexer.read_u16()?;
        let central_directory_size = indexer.read_u32()?;
        let offset_of_start_of_central_directory = indexer.read_u32()?;
        let zip_file_comment_length = indexer.read_u16()?;

        let archive_comment = indexer
            .read_bytes(zip_file_comment_length as usize)?
            .to_vec();

        Ok(CentralDirectoryEnd {
            number_of_this_disk,
            number_of_the_disk_with_central_directory,
            total_number_of_entries_on_this_disk,
            total_number_of_entries_in_the_central_directory,
            central_directory_size,
            offset_of_start_of_central_directory,
            archive_comment,
        })
    }
}
