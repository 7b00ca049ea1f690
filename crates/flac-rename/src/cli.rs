use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "flac-rename", version)]
pub struct Args {
    /// Directory containing FLAC files
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Use each file's own artist and move it into a directory named after its album
    #[arg(long)]
    pub organize: bool,

    /// Rename without asking
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
