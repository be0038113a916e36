//! Build an archive on the tokio blocking pool.
//!
//! Each entry is checksummed and compressed on its own blocking task. The results are awaited
//! in path order, not completion order, so the output is byte-identical to
//! [`create_predictable_zip`](crate::create_predictable_zip).
//!
//! # Features
//!
//! Requires `tokio` feature
use ::tokio::task::{spawn_blocking, JoinHandle};
use tracing::debug;

use super::archive::{collect, PredictableZip};
use super::common::{build_entry, ArchiveLayout};
use crate::error::ArchiveError;
use crate::types::{ArchiveFileEntry, Payload};

/// Asynchronous counterpart of [`create_predictable_zip`](crate::create_predictable_zip).
///
/// Must be called from within a tokio runtime.
///
/// ```
/// use predictable_zip::{create_predictable_zip, create_predictable_zip_async};
///
/// #[tokio::main]
/// async fn main() -> Result<(), predictable_zip::ArchiveError> {
///     let files = [("test.txt", "Hello World"), ("folder/nested.txt", "Nested content")];
///
///     let parallel = create_predictable_zip_async(files).await?;
///     assert_eq!(parallel, create_predictable_zip(files)?);
///     Ok(())
/// }
/// ```
pub async fn create_predictable_zip_async<I, K, V>(files: I) -> Result<Vec<u8>, ArchiveError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Payload>,
{
    finish_async(collect(files)?).await
}

/// Same as [`PredictableZip::finish`], compressing entries in parallel.
pub async fn finish_async(archive: PredictableZip) -> Result<Vec<u8>, ArchiveError> {
    let entries = archive.into_entries();
    debug!(entries = entries.len(), "building archive on the blocking pool");

    // spawned in path order, each handle resolves independently
    let handles: Vec<JoinHandle<Result<ArchiveFileEntry, ArchiveError>>> = entries
        .into_iter()
        .map(|(path, payload)| spawn_blocking(move || build_entry(&path, &payload)))
        .collect();

    let mut layout = ArchiveLayout::new();
    for handle in handles {
        layout = layout.append(handle.await??)?;
    }

    layout.finish()
}
