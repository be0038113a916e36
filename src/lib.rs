//! A library for creating ZIP archives whose bytes are reproducible: the same set of named
//! payloads always produces the same archive, whatever the insertion order, the host, the
//! clock or the file system permissions. The archive hash can then be used as a
//! content-addressable identifier, and compared with archives built by other implementations
//! of the same layout.
//!
//! ZIP is an archive file format that supports lossless data compression. Ordinary ZIP writers
//! embed the current time, the platform's permission bits and keep the insertion order of the
//! entries. This crate fixes all three:
//!
//! * entries are written in ascending byte order of their path, `\` being normalized to `/`,
//! * every entry is dated 2015-10-21 07:28:00 and carries the Unix mode `rw-------`,
//! * every payload is compressed with raw DEFLATE, level 6, 2^15 window, memory level 8.
//!
//! The exact values are listed in [`constants`].
//!
//! The current implementation is based on
//!
//! [PKWARE's APPNOTE.TXT v6.3.10](https://pkware.cachefly.net/webdocs/casestudies/APPNOTE.TXT)
//!
//! ## Features
//!
//! Feature  | Description
//! ---------|------
//! tokio    | Compress entries in parallel on the tokio blocking pool, see [`create_predictable_zip_async`]
//! cli      | The `predictable-zip` command line tool
//!
//! ## Examples
//!
//! ### Build an archive
//!
//!```rust
//! use std::collections::HashMap;
//! use predictable_zip::{create_predictable_zip, ArchiveError};
//!
//! fn main() -> Result<(), ArchiveError> {
//!     let files = HashMap::from([
//!         ("folder/nested.txt", "Nested content"),
//!         ("test.txt", "Hello World"),
//!     ]);
//!
//!     let zip = create_predictable_zip(files)?;
//!     assert_eq!(zip.len(), 253);
//!
//!     Ok(())
//! }
//!```
//!
//! ### Locate the entry point of zipped web content
//!
//!```rust
//! use predictable_zip::{create_predictable_zip, find_first_html, ArchiveError};
//!
//! fn main() -> Result<(), ArchiveError> {
//!     let zip = create_predictable_zip([
//!         ("lesson/index.html", "<html></html>"),
//!         ("lesson/pages/intro.html", "<html></html>"),
//!         ("lesson/app.js", "start()"),
//!     ])?;
//!
//!     assert_eq!(find_first_html(&zip)?.as_deref(), Some("lesson/index.html"));
//!
//!     Ok(())
//! }
//!```
//!
//! ## Limits
//!
//! No ZIP64, encryption, multi-disk archives or streaming output. Archives are limited to
//! 65535 entries and 4 GiB, entry paths to 65535 bytes.

pub mod constants;

pub mod archive_common;
pub mod compress;
pub mod compression;
pub mod error;
pub mod locator;
pub mod types;
pub mod uncompress;

pub use compress::archive::{create_predictable_zip, PredictableZip};
#[cfg(feature = "tokio")]
pub use compress::tokio::create_predictable_zip_async;
pub use error::ArchiveError;
pub use locator::{find_common_root, find_first_html, find_first_html_in};
pub use types::Payload;
pub use uncompress::{ArchiveEntry, ArchiveReader};
