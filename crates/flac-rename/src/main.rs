//! flac-rename: give per-track FLAC files consistent names.
//!
//! By default every file becomes `<album artist> - <disc.><NN> - <title>.flac`
//! in place. With `--organize` each file keeps its own artist and moves into
//! a directory named after its album. The planned renames are printed as a
//! table and only carried out after confirmation.

mod cli;
mod rename;

use anyhow::{Context, Result, bail};
use clap::Parser;
use flac_meta::prompt::{Prompt, StdinPrompt, accepts_explicitly};
use flac_meta::source::SymphoniaReader;
use tracing_subscriber::EnvFilter;

fn list_flacs(dir: &std::path::Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read dir {:?}", dir))? {
        let path = entry
            .with_context(|| format!("read dir entry in {:?}", dir))?
            .path();
        let is_flac = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("flac"));
        if is_flac && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let directory = std::path::absolute(&args.directory)
        .with_context(|| format!("resolve {:?}", args.directory))?;
    let files = list_flacs(&directory)?;
    if files.is_empty() {
        bail!("no FLAC files in {:?}", directory);
    }

    let reader = SymphoniaReader;
    let layout = if args.organize {
        rename::Layout::ByAlbum
    } else {
        rename::Layout::flat(&files, &reader)?
    };
    let renames = rename::plan(&files, &reader, &layout)?;

    let title = directory.display().to_string();
    rename::print_table(&mut std::io::stdout(), &rename::table(&title, &renames))?;

    if !args.yes && !accepts_explicitly(&StdinPrompt.ask("Perform renaming? ")?) {
        tracing::info!("nothing renamed");
        return Ok(());
    }
    let renamed = rename::apply(&renames)?;
    tracing::info!(renamed, total = renames.len(), "done");
    Ok(())
}
