//! flac-to-mka: merge a FLAC album into one Matroska audio file.
//!
//! ## Modes
//! - **CUE**: a single FLAC described by a CUE sheet is muxed as-is.
//! - **Multi-FLAC**: per-track FLAC files are merged with SoX, then muxed;
//!   `--cue`/`--cueflac` stop after writing a CUE sheet (and merged FLAC).
//!
//! Tags and chapters are written as Matroska XML next to the output and
//! passed to mkvmerge together with the cover art. Every generated sidecar is
//! removed when the run ends unless the mode keeps it.

mod artwork;
mod cleanup;
mod cli;
mod config;
mod discover;
mod modes;
mod tools;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use flac_meta::prompt::StdinPrompt;
use flac_meta::source::SymphoniaReader;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let mut args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();
    args.source = std::path::absolute(&args.source)
        .with_context(|| format!("resolve {:?}", args.source))?;

    let tools = match &args.config {
        Some(path) => config::ToolsConfig::load(path)?.resolve(),
        None => config::Tools::default(),
    };

    let cleanup = cleanup::CleanupRegistry::new();
    let cleanup_for_signal = cleanup.clone();
    let _ = ctrlc::set_handler(move || {
        let removed = cleanup_for_signal.clean_all();
        tracing::info!(removed, "interrupted");
        std::process::exit(130);
    });

    let reader = SymphoniaReader;
    let mut prompt = StdinPrompt;
    let mut stdout = std::io::stdout();
    let mut job = modes::Job {
        args: &args,
        tools: &tools,
        cleanup: &cleanup,
        reader: &reader,
        prompt: &mut prompt,
        out: &mut stdout,
    };
    modes::run(&mut job)
}
