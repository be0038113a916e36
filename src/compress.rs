//! Build reproducible archives.
//!
//! An archive built here is laid out as:
//!
//! <table>
//! <tr><th>Section</th><th>Content</th></tr>
//! <tr><td>Local entries</td><td>for each path in ascending byte order: a 30 bytes header,
//! the file name, the raw DEFLATE payload</td></tr>
//! <tr><td>Central directory</td><td>a 46 bytes record and the file name per entry, same
//! order</td></tr>
//! <tr><td>End of central directory</td><td>22 bytes, no comment</td></tr>
//! </table>
//!
//! Timestamps, permissions and versions are the constants of [`crate::constants`].

pub mod archive;
mod common;
#[cfg(feature = "tokio")]
pub mod tokio;

pub use common::normalize_path;
