//! Fixed values of the archive layout.
//!
//! Every value in this module is part of a cross-language binary contract: archives produced
//! by another implementation must hash to the same bytes, so none of these may be derived
//! from the environment (clock, file system permissions, platform).
//!
//! Text payloads are part of the contract only when ASCII, see [`crate::types::Payload`].
use std::mem::size_of;

pub const FILE_HEADER_BASE_SIZE: usize = 7 * size_of::<u16>() + 4 * size_of::<u32>();
pub const CENTRAL_DIRECTORY_ENTRY_BASE_SIZE: usize = 11 * size_of::<u16>() + 6 * size_of::<u32>();
pub const END_OF_CENTRAL_DIRECTORY_SIZE: usize = 5 * size_of::<u16>() + 3 * size_of::<u32>();

pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
pub const CENTRAL_DIRECTORY_ENTRY_SIGNATURE: u32 = 0x02014b50;
pub const CENTRAL_DIRECTORY_END_SIGNATURE: u32 = 0x06054b50;

/// Minimum version needed to extract: 2.0, DEFLATE.
pub const VERSION_NEEDED: u16 = 20;
/// Version made by: APPNOTE version 2.0 in the low byte, host system 0 (MS-DOS) in the high byte.
pub const VERSION_MADE_BY: u16 = (HOST_SYSTEM as u16) << 8 | 20;
pub const HOST_SYSTEM: u8 = 0;

pub const GENERAL_PURPOSE_FLAGS: u16 = 0;

/// 07:28:00 in MS-DOS time encoding.
pub const FIXED_LAST_MOD_FILE_TIME: u16 = 0x3B80;
/// 2015-10-21 in MS-DOS date encoding.
pub const FIXED_LAST_MOD_FILE_DATE: u16 = 0x4755;

/// Unix `rw-------` in the high 16 bits.
pub const FIXED_EXTERNAL_FILE_ATTRIBUTES: u32 = 0o600 << 16;
pub const INTERNAL_FILE_ATTRIBUTES: u16 = 0;

pub const DEFLATE_LEVEL: u32 = 6;
pub const DEFLATE_WINDOW_BITS: u8 = 15;
pub const DEFLATE_MEM_LEVEL: u8 = 8;
pub const DEFLATE_STRATEGY: u8 = 0;

/// Upper bound of the archive comment, bounds the backward search for the end record.
pub const MAX_ARCHIVE_COMMENT_SIZE: usize = u16::MAX as usize;
