use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive error {0}")]
    IoError(#[from] std::io::Error),

    #[error("The entry path is empty")]
    EmptyPath,

    #[error("Two payloads normalize to the same entry path '{0}'")]
    DuplicatePath(String),

    #[error("The entry path '{path}' is {len} bytes long, the limit is {max}", max = u16::MAX)]
    FileNameTooLong { path: String, len: usize },

    #[error("The entry '{path}' is {size} bytes, larger than a 32-bit Zip field allows")]
    EntryTooLarge { path: String, size: u64 },

    #[error("The archive exceeds the limits of a non ZIP64 archive: {0}")]
    ArchiveTooLarge(String),

    #[error("The compression method code '{0}' is not supported")]
    UnsupportedCompressionMethodCode(u16),

    #[error("Bad archive structure : {0}")]
    BadArchiveStructure(String),

    #[error("Entry '{name}' failed its integrity check: expected crc {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("Entry '{0}' not found in the archive")]
    EntryNotFound(String),

    #[cfg(feature = "tokio")]
    #[error("Compression task failed : {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
