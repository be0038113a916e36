use core::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::constants::{FIXED_LAST_MOD_FILE_DATE, FIXED_LAST_MOD_FILE_TIME};

/// The content of one archive entry.
///
/// Text is written as its UTF-8 code units, one byte per code unit. Bytes are written verbatim.
///
/// Only ASCII text is guaranteed to hash like archives from implementations that truncate
/// UTF-16 code units to bytes: `"é"` is 2 bytes here and 1 byte there. Pass
/// [`Payload::Bytes`] when non-ASCII content must match such an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Bytes(bytes) => bytes,
            Payload::Text(text) => text.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_owned())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Payload::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value)
    }
}

impl<const N: usize> From<[u8; N]> for Payload {
    fn from(value: [u8; N]) -> Self {
        Payload::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(value: &[u8; N]) -> Self {
        Payload::Bytes(value.to_vec())
    }
}

/// One entry of an archive being built: the normalized path, the compressed payload and the
/// values shared by its local header and its central directory record.
#[derive(Debug)]
pub struct ArchiveFileEntry {
    pub file_name_as_bytes: Vec<u8>,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    /// Offset of the local header from the start of the archive, known once laid out.
    pub offset: u32,
    pub compressed: Vec<u8>,
}

impl ArchiveFileEntry {
    pub fn file_name_len(&self) -> u16 {
        // bounded at build time
        self.file_name_as_bytes.len() as u16
    }

    pub fn file_name(&self) -> String {
        String::from_utf8_lossy(&self.file_name_as_bytes).into_owned()
    }
}

/// A MS-DOS date and time pair as stored in Zip headers.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    /// The timestamp written for every entry: 2015-10-21 07:28:00.
    pub const FIXED: DosDateTime = DosDateTime {
        date: FIXED_LAST_MOD_FILE_DATE,
        time: FIXED_LAST_MOD_FILE_TIME,
    };

    pub fn from_msdos(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    /// Encode a calendar date and time. Returns `None` outside of 1980..=2107.
    pub fn from_naive(datetime: NaiveDateTime) -> Option<Self> {
        let year = u16::try_from(datetime.year()).ok()?.checked_sub(1980)?;
        if year > 127 {
            return None;
        }

        let date = datetime.day() as u16 | (datetime.month() as u16) << 5 | year << 9;
        let time = (datetime.second() / 2) as u16
            | (datetime.minute() as u16) << 5
            | (datetime.hour() as u16) << 11;

        Some(Self { date, time })
    }

    /// Decode to a calendar date and time, `None` when the fields are out of range.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let seconds = (self.time & 0b0000000000011111) << 1;
        let minutes = (self.time & 0b0000011111100000) >> 5;
        let hours = (self.time & 0b1111100000000000) >> 11;
        let days = self.date & 0b0000000000011111;
        let months = (self.date & 0b0000000111100000) >> 5;
        let years = (self.date & 0b1111111000000000) >> 9;

        NaiveDate::from_ymd_opt(years as i32 + 1980, months as u32, days as u32)?.and_hms_opt(
            hours as u32,
            minutes as u32,
            seconds as u32,
        )
    }
}

impl fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive() {
            Some(datetime) => write!(f, "{}", datetime),
            None => write!(f, "invalid ({:#06x} {:#06x})", self.date, self.time),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn back_to_the_future() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 10, 21)
            .unwrap()
            .and_hms_opt(7, 28, 0)
            .unwrap()
    }

    #[test]
    fn fixed_timestamp_decodes() {
        assert_eq!(DosDateTime::FIXED.to_naive(), Some(back_to_the_future()));
        assert_eq!(DosDateTime::FIXED.to_string(), "2015-10-21 07:28:00");
    }

    #[test]
    fn fixed_timestamp_encodes() {
        assert_eq!(
            DosDateTime::from_naive(back_to_the_future()),
            Some(DosDateTime::FIXED)
        );
    }

    #[test]
    fn out_of_range_years() {
        let before = NaiveDate::from_ymd_opt(1979, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(DosDateTime::from_naive(before), None);

        let after = NaiveDate::from_ymd_opt(2108, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(DosDateTime::from_naive(after), None);
    }

    #[test]
    fn zero_is_not_a_date() {
        let zero = DosDateTime::from_msdos(0, 0);
        assert_eq!(zero.to_naive(), None);
        assert_eq!(zero.to_string(), "invalid (0x0000 0x0000)");
    }

    #[test]
    fn payload_bytes() {
        assert_eq!(Payload::from("Hello").as_bytes(), b"Hello");
        assert_eq!(Payload::from("é").len(), 2);
        assert_eq!(Payload::from([0u8, 1, 2, 3]).as_bytes(), &[0, 1, 2, 3]);
        assert!(Payload::from(Vec::<u8>::new()).is_empty());
    }
}
