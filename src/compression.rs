use std::fmt::Display;
use std::io::{Read, Write};

use crc32fast::Hasher;
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};

use crate::constants::DEFLATE_LEVEL;
use crate::error::ArchiveError;

pub const STORE: u16 = 0;
pub const DEFLATE: u16 = 8;

/// Compression methods understood by this crate.
///
/// The writer only ever emits [`CompressionMethod::Deflate`]. The reader additionally accepts
/// stored entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Store(),
    Deflate(),
}

impl CompressionMethod {
    pub fn zip_code(&self) -> u16 {
        match self {
            CompressionMethod::Store() => STORE,
            CompressionMethod::Deflate() => DEFLATE,
        }
    }

    pub fn from_compression_method(compression_method: u16) -> Result<Self, ArchiveError> {
        match compression_method {
            STORE => Ok(CompressionMethod::Store()),
            DEFLATE => Ok(CompressionMethod::Deflate()),
            _ => Err(ArchiveError::UnsupportedCompressionMethodCode(
                compression_method,
            )),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CompressionMethod::Store() => "store",
            CompressionMethod::Deflate() => "deflate",
        }
    }
}

impl Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// CRC-32 (IEEE 802.3 polynomial) of `data`.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Raw DEFLATE (RFC 1951, no zlib or gzip framing) at level 6.
///
/// flate2's zlib backend initializes the stream with a 2^15 window, memory level 8 and the
/// default strategy, which is the parameter set zlib-based encoders use for level 6.
pub fn deflate_raw(data: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut encoder = DeflateEncoder::new(
        Vec::with_capacity(data.len() / 2 + 16),
        Compression::new(DEFLATE_LEVEL),
    );
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`deflate_raw`], `size_hint` is the expected uncompressed size.
pub fn inflate_raw(data: &[u8], size_hint: usize) -> Result<Vec<u8>, ArchiveError> {
    let mut decoder = DeflateDecoder::new(data);
    // DEFLATE expands at most 1032:1, a larger declared size is not trusted
    let mut buffer = Vec::with_capacity(size_hint.min(data.len().saturating_mul(1032)));
    decoder.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Decode an entry's payload according to its method.
pub fn decompress(
    method: CompressionMethod,
    data: &[u8],
    size_hint: usize,
) -> Result<Vec<u8>, ArchiveError> {
    match method {
        CompressionMethod::Store() => Ok(data.to_vec()),
        CompressionMethod::Deflate() => inflate_raw(data, size_hint),
    }
}
