//! Locate the shared root directory of an archive and its HTML entry point.
//!
//! Zipped web content conventionally starts at `index.html`, but producers do not always put
//! it at the archive root: a whole site is often zipped from its parent directory. Selection
//! works on paths relative to the common root of all files and follows these priorities:
//!
//! 1. `index.html` directly under the common root,
//! 2. any other `index.html`, the shallowest first,
//! 3. any `.html` file, the shallowest first.
//!
//! Ties at equal depth go to the shortest path, then to byte order. File names are compared
//! case-insensitively; the returned path is the entry name as stored in the archive.
use std::io::{Cursor, Read, Seek};

use tracing::debug;

use crate::compress::normalize_path;
use crate::error::ArchiveError;
use crate::uncompress::ArchiveReader;

const HTML_EXTENSION: &str = ".html";
const INDEX_FILE_NAME: &str = "index.html";

/// Longest directory prefix shared by all `paths`, components joined by `/`.
///
/// `paths` are file paths: their last component is never part of the root. Backslashes are
/// read as separators.
///
/// ```
/// use predictable_zip::find_common_root;
///
/// assert_eq!(find_common_root(["site/index.html", "site/css/main.css"]), "site");
/// assert_eq!(find_common_root(["site/lesson/index.html"]), "site/lesson");
/// assert_eq!(find_common_root(Vec::<String>::new()), "");
/// ```
pub fn find_common_root<I, S>(paths: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let directories: Vec<Vec<String>> = paths
        .into_iter()
        .map(|path| directory_components(path.as_ref()))
        .collect();

    let Some((first, others)) = directories.split_first() else {
        return String::new();
    };

    let depth = first
        .iter()
        .enumerate()
        .take_while(|(index, component)| {
            others
                .iter()
                .all(|directory| directory.get(*index) == Some(*component))
        })
        .count();

    first[..depth].join("/")
}

fn directory_components(path: &str) -> Vec<String> {
    let normalized = normalize_path(path);
    let mut components: Vec<String> = normalized
        .split('/')
        .filter(|component| !component.is_empty())
        .map(str::to_owned)
        .collect();

    // a trailing slash marks a directory, keep it whole
    if !normalized.ends_with('/') {
        components.pop();
    }
    components
}

#[derive(Debug)]
struct HtmlCandidate<'a> {
    path: &'a str,
    relative: String,
    depth: usize,
}

impl HtmlCandidate<'_> {
    fn is_index(&self) -> bool {
        let file_name = self.relative.rsplit('/').next().unwrap_or_default();
        file_name.eq_ignore_ascii_case(INDEX_FILE_NAME)
    }

    fn rank(&self) -> (usize, usize, &str) {
        (self.depth, self.relative.len(), self.relative.as_str())
    }
}

fn is_html(path: &str) -> bool {
    path.len() >= HTML_EXTENSION.len()
        && path.as_bytes()[path.len() - HTML_EXTENSION.len()..]
            .eq_ignore_ascii_case(HTML_EXTENSION.as_bytes())
}

fn strip_root<'a>(normalized: &'a str, root: &str) -> &'a str {
    if root.is_empty() {
        return normalized;
    }

    normalized
        .strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(normalized)
}

/// Pick the HTML entry point among already enumerated entry names.
///
/// Directory entries (names ending with a separator) are ignored. Returns `None` when no
/// `.html` file is present.
///
/// ```
/// use predictable_zip::locator::select_html_entry;
///
/// let entry = select_html_entry(["a/index.html", "a/b/page.html"]);
/// assert_eq!(entry.as_deref(), Some("a/index.html"));
///
/// let entry = select_html_entry(["lesson/part2/b.html", "lesson/a.html", "lesson/res.js"]);
/// assert_eq!(entry.as_deref(), Some("lesson/a.html"));
/// ```
pub fn select_html_entry<I, S>(paths: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let files: Vec<S> = paths
        .into_iter()
        .filter(|path| {
            let path = path.as_ref();
            !path.is_empty() && !path.ends_with('/') && !path.ends_with('\\')
        })
        .collect();

    let root = find_common_root(files.iter().map(|path| path.as_ref()));

    let candidates: Vec<HtmlCandidate> = files
        .iter()
        .map(|path| path.as_ref())
        .filter(|path| is_html(path))
        .map(|path| {
            let normalized = normalize_path(path);
            let relative = strip_root(&normalized, &root).to_owned();
            let depth = relative.matches('/').count();
            HtmlCandidate {
                path,
                relative,
                depth,
            }
        })
        .collect();

    if candidates.is_empty() {
        debug!(root = %root, "no html file in archive");
        return None;
    }

    let selected = candidates
        .iter()
        .find(|candidate| candidate.relative.eq_ignore_ascii_case(INDEX_FILE_NAME))
        .or_else(|| {
            candidates
                .iter()
                .filter(|candidate| candidate.is_index())
                .min_by(|a, b| a.rank().cmp(&b.rank()))
        })
        .or_else(|| candidates.iter().min_by(|a, b| a.rank().cmp(&b.rank())))?;

    debug!(
        root = %root,
        candidates = candidates.len(),
        selected = selected.path,
        "html entry point resolved"
    );

    Some(selected.path.to_owned())
}

/// Find the HTML entry point of a zip archive held in memory.
///
/// ```
/// use predictable_zip::{create_predictable_zip, find_first_html};
///
/// let zip = create_predictable_zip([
///     ("course/index.html", "<html></html>"),
///     ("course/unit/page.html", "<html></html>"),
/// ])?;
/// assert_eq!(find_first_html(&zip)?.as_deref(), Some("course/index.html"));
/// # Ok::<(), predictable_zip::ArchiveError>(())
/// ```
pub fn find_first_html(archive: &[u8]) -> Result<Option<String>, ArchiveError> {
    find_first_html_in(Cursor::new(archive))
}

/// Same as [`find_first_html`] for any seekable source, e.g. a [`std::fs::File`].
pub fn find_first_html_in<R>(reader: R) -> Result<Option<String>, ArchiveError>
where
    R: Read + Seek,
{
    let archive = ArchiveReader::new(reader)?;
    Ok(select_html_entry(archive.file_names()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_common_root_degenerate_cases() {
        assert_eq!(find_common_root(Vec::<&str>::new()), "");
        assert_eq!(find_common_root(["index.html"]), "");
        assert_eq!(find_common_root(["a/b/c.txt"]), "a/b");
    }

    #[test]
    fn test_common_root_stops_at_first_disagreement() {
        assert_eq!(
            find_common_root(["root/a/x/1.txt", "root/a/y/2.txt", "root/a/3.txt"]),
            "root/a"
        );
        assert_eq!(find_common_root(["a/1.txt", "b/2.txt"]), "");
        assert_eq!(find_common_root(["a/b/1.txt", "a/bc/2.txt"]), "a");
    }

    #[test]
    fn test_common_root_normalizes_separators() {
        assert_eq!(
            find_common_root(["site\\pages\\a.html", "site/pages/b.html"]),
            "site/pages"
        );
    }

    #[test]
    fn test_common_root_of_directory_entry() {
        assert_eq!(find_common_root(["site/assets/"]), "site/assets");
    }

    #[test]
    fn test_root_index_wins() {
        assert_eq!(
            select_html_entry(["a/index.html", "a/b/page.html"]).as_deref(),
            Some("a/index.html")
        );
        assert_eq!(
            select_html_entry(["x/a.html", "x/INDEX.HTML", "x/b/index.html"]).as_deref(),
            Some("x/INDEX.HTML")
        );
    }

    #[test]
    fn test_nested_index_beats_shallower_page() {
        assert_eq!(
            select_html_entry(["about.html", "app/deep/index.html", "app/index.html"]).as_deref(),
            Some("app/index.html")
        );
    }

    #[test]
    fn test_shallowest_then_shortest() {
        assert_eq!(
            select_html_entry(["s/long-name.html", "s/b.html", "s/x/a.html"]).as_deref(),
            Some("s/b.html")
        );
        assert_eq!(
            select_html_entry(["s/b.html", "s/a.html", "s/q/z.css"]).as_deref(),
            Some("s/a.html")
        );
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(
            select_html_entry(["doc/Start.HTML", "doc/readme.txt"]).as_deref(),
            Some("doc/Start.HTML")
        );
        assert_eq!(select_html_entry(["page.htm", "style.css"]), None);
    }

    #[test]
    fn test_directories_and_empty_input() {
        assert_eq!(select_html_entry(Vec::<String>::new()), None);
        assert_eq!(
            select_html_entry(["site/", "site/index.html/", "site/main.html"]).as_deref(),
            Some("site/main.html")
        );
    }

    #[test]
    fn test_backslash_entries_keep_stored_name() {
        assert_eq!(
            select_html_entry(["pkg\\index.html", "pkg\\js\\app.js"]).as_deref(),
            Some("pkg\\index.html")
        );
    }
}
