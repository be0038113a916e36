//! Command line front end: `pack`, `entry` and `list`.

mod cli;

use std::fs::{self, File};
use std::io::BufReader;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{collect_directory, default_output, Cli, Command};
use predictable_zip::{create_predictable_zip, find_first_html_in, ArchiveReader};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Pack { dir, output } => {
            let files = collect_directory(&dir)?;
            info!(files = files.len(), dir = %dir.display(), "directory collected");

            let zip = create_predictable_zip(files)
                .with_context(|| format!("archiving {}", dir.display()))?;

            let output = output.unwrap_or_else(|| default_output(&dir));
            fs::write(&output, &zip).with_context(|| format!("writing {}", output.display()))?;

            println!("{:x}  {}", md5::compute(&zip), output.display());
            Ok(ExitCode::SUCCESS)
        }

        Command::Entry { file } => {
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("opening {}", file.display()))?,
            );

            match find_first_html_in(reader)
                .with_context(|| format!("reading {}", file.display()))?
            {
                Some(entry) => {
                    println!("{entry}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("{}: no HTML file", file.display());
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::List { file, long } => {
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("opening {}", file.display()))?,
            );
            let archive =
                ArchiveReader::new(reader).with_context(|| format!("reading {}", file.display()))?;

            if long {
                print!("{archive}");
            } else {
                for entry in archive.entries() {
                    println!(
                        "{:>10}  {}  {}",
                        entry.uncompressed_size, entry.last_modified, entry.name
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
