//! Main entry point for the zipfs CLI application.
//!
//! Lists directories and prints files through the zip overlay, so paths
//! that cross into a `.zip` archive work like ordinary ones.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use zipfs::cli::Command;
use zipfs::{Cli, EntryKind, FileSystem, RealFs, RealFsOptions, ZipFs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let fs = ZipFs::new(RealFs::new(RealFsOptions {
        watch: false,
        working_dir: cli.cwd.clone(),
    }));

    match &cli.command {
        Command::Ls { path } => list_directory(&fs, path).await?,
        Command::Cat { paths } => {
            for path in paths {
                print_file(&fs, path).await?;
            }
        }
    }

    if cli.stats {
        let stats = fs.archives().stats();
        eprintln!(
            "archives cached: {}, archive loads: {}, entry reads: {}",
            fs.archives().len(),
            stats.archive_loads(),
            stats.entry_reads()
        );
    }

    Ok(())
}

/// Resolve `path` against the working directory
fn absolute<F: FileSystem>(fs: &F, path: &str) -> Result<String> {
    fs.abs(path)
        .with_context(|| format!("cannot resolve {path}: working directory unknown"))
}

/// Print one line per entry, directories marked with a trailing slash
async fn list_directory<F: FileSystem>(fs: &F, path: &str) -> Result<()> {
    let path = absolute(fs, path)?;
    let listing = fs
        .read_directory(&path)
        .await
        .with_context(|| format!("cannot list {path}"))?;

    let mut stdout = tokio::io::stdout();
    for entry in listing.sorted_entries() {
        let marker = match entry.kind() {
            EntryKind::Dir => "/",
            EntryKind::File => "",
        };
        stdout
            .write_all(format!("{}{}\n", entry.base(), marker).as_bytes())
            .await?;
    }
    stdout.flush().await?;
    Ok(())
}

async fn print_file<F: FileSystem>(fs: &F, path: &str) -> Result<()> {
    let path = absolute(fs, path)?;
    let contents = fs
        .read_file(&path)
        .await
        .with_context(|| format!("cannot read {path}"))?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(contents.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
