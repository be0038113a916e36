use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "predictable-zip")]
#[command(version)]
#[command(about = "Build reproducible zip archives and find their HTML entry point", long_about = None)]
#[command(after_help = "Examples:\n  \
  predictable-zip pack site -o site.zip     archive a directory, print its md5\n  \
  predictable-zip entry lesson.zip          print the HTML entry point\n  \
  predictable-zip list -l lesson.zip        show the central directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-vv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Archive every file of a directory, paths relative to it
    Pack {
        /// Directory to archive
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Output archive (default: <DIR>.zip)
        #[arg(short = 'o', long, value_name = "FILE", env = "PREDICTABLE_ZIP_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Print the HTML entry point of an archive
    Entry {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List the entries of an archive
    List {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Show every central directory field
        #[arg(short = 'l', long)]
        long: bool,
    },
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "predictable_zip=debug,info",
            _ => "predictable_zip=trace,debug",
        }
    }
}

/// Default output of `pack`: the directory name with a `.zip` extension, next to it.
pub fn default_output(dir: &Path) -> PathBuf {
    let mut output = dir.as_os_str().to_owned();
    output.push(".zip");
    PathBuf::from(output)
}

/// Read every regular file below `root`, keyed by its `/` separated path relative to `root`.
///
/// Symbolic links are not followed.
pub fn collect_directory(root: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} is not below {}", entry.path().display(), root.display()))?;

        let name = relative
            .components()
            .map(|component| {
                component
                    .as_os_str()
                    .to_str()
                    .with_context(|| format!("{} is not valid UTF-8", relative.display()))
            })
            .collect::<Result<Vec<_>>>()?
            .join("/");

        let data =
            fs::read(entry.path()).with_context(|| format!("reading {}", entry.path().display()))?;
        files.insert(name, data);
    }

    Ok(files)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_collect_directory_relative_paths() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("site/css"))?;
        fs::write(dir.path().join("site/index.html"), "<html></html>")?;
        fs::write(dir.path().join("site/css/main.css"), "body {}")?;

        let files = collect_directory(dir.path())?;

        assert_eq!(
            files.keys().collect::<Vec<_>>(),
            ["site/css/main.css", "site/index.html"]
        );
        assert_eq!(files["site/index.html"], b"<html></html>");
        Ok(())
    }

    #[test]
    fn test_collect_empty_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("empty"))?;

        assert!(collect_directory(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_default_output() {
        assert_eq!(default_output(Path::new("out/site")), PathBuf::from("out/site.zip"));
    }

    #[test]
    fn test_parse_pack() {
        let cli = Cli::parse_from(["predictable-zip", "-v", "pack", "site", "-o", "a.zip"]);

        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Command::Pack { ref dir, output: Some(ref output) }
                if dir == Path::new("site") && output == Path::new("a.zip")
        ));
    }
}
