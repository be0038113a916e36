use std::collections::btree_map::{BTreeMap, Entry};

use tracing::debug;

use super::common::{build_entry, normalize_path, ArchiveLayout};
use crate::error::ArchiveError;
use crate::types::Payload;

/// A reproducible zip archive.
///
/// Add payloads in any order using [`add`](Self::add()), then produce the archive bytes with
/// [`finish`](Self::finish()). Entries are always written in ascending byte order of their
/// normalized path, so the output only depends on the set of `(path, payload)` pairs.
///
/// ```
/// use predictable_zip::PredictableZip;
///
/// let mut archive = PredictableZip::new();
/// archive.add("test.txt", "Hello World")?;
/// archive.add("folder\\nested.txt", "Nested content")?;
///
/// let bytes = archive.finish()?;
/// assert_eq!(&bytes[..4], b"PK\x03\x04");
/// # Ok::<(), predictable_zip::ArchiveError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct PredictableZip {
    entries: BTreeMap<String, Payload>,
}

impl PredictableZip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a payload under `path`. Backslashes in `path` are turned into forward slashes.
    ///
    /// # Errors
    ///
    /// * [`ArchiveError::EmptyPath`] if `path` is empty
    /// * [`ArchiveError::DuplicatePath`] if another payload has the same normalized path
    pub fn add<P>(&mut self, path: &str, payload: P) -> Result<(), ArchiveError>
    where
        P: Into<Payload>,
    {
        if path.is_empty() {
            return Err(ArchiveError::EmptyPath);
        }

        match self.entries.entry(normalize_path(path)) {
            Entry::Occupied(occupied) => Err(ArchiveError::DuplicatePath(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(payload.into());
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized paths, in archive order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, Payload> {
        self.entries
    }

    /// Compress every payload and assemble the archive.
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        debug!(entries = self.entries.len(), "building archive");

        self.entries
            .iter()
            .try_fold(ArchiveLayout::new(), |layout, (path, payload)| {
                layout.append(build_entry(path, payload)?)
            })?
            .finish()
    }
}

/// Create a zip archive whose bytes only depend on the given `(path, payload)` pairs.
///
/// `files` can be any collection of pairs: a `HashMap`, a `BTreeMap`, a `Vec` or an array.
/// Iteration order does not matter.
///
/// ```
/// use std::collections::HashMap;
/// use predictable_zip::create_predictable_zip;
///
/// let files = HashMap::from([("b.txt", "content b"), ("a.txt", "content a")]);
/// let zip = create_predictable_zip(files)?;
///
/// let reversed = create_predictable_zip([("a.txt", "content a"), ("b.txt", "content b")])?;
/// assert_eq!(zip, reversed);
/// # Ok::<(), predictable_zip::ArchiveError>(())
/// ```
pub fn create_predictable_zip<I, K, V>(files: I) -> Result<Vec<u8>, ArchiveError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Payload>,
{
    collect(files)?.finish()
}

pub(crate) fn collect<I, K, V>(files: I) -> Result<PredictableZip, ArchiveError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Payload>,
{
    let mut archive = PredictableZip::new();
    for (path, payload) in files {
        archive.add(path.as_ref(), payload)?;
    }
    Ok(archive)
}
