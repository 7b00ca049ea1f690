use std::path::PathBuf;

use clap::Parser;
use clap::builder::PossibleValuesParser;
use flac_meta::metadata::Overrides;
use flac_meta::tags::MEDIUM_CHOICES;

#[derive(Parser, Debug)]
#[command(name = "flac-to-mka", version)]
pub struct Args {
    /// Directory containing source files, or a CUE sheet
    pub source: PathBuf,

    /// Output file name (with an extension) or output directory
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Manually specify cover art file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Skip resolution and aspect ratio check of cover art
    #[arg(long)]
    pub forceimage: bool,

    /// Manually specify genre
    #[arg(long)]
    pub genre: Option<String>,

    /// Manually specify year (first release)
    #[arg(long)]
    pub year: Option<String>,

    /// Manually specify artist
    #[arg(long)]
    pub artist: Option<String>,

    /// Manually specify album
    #[arg(long)]
    pub album: Option<String>,

    /// Label that issued this release; useful for re-releases
    #[arg(long)]
    pub label: Option<String>,

    /// Date this version was released; useful for re-releases
    #[arg(long)]
    pub issuedate: Option<String>,

    /// Version of release; useful for regional releases, volumes, or special editions
    #[arg(long = "version-tag")]
    pub version_tag: Option<String>,

    /// Source medium of release
    #[arg(long, value_parser = PossibleValuesParser::new(MEDIUM_CHOICES))]
    pub medium: Option<String>,

    /// Disc number (must specify number of discs)
    #[arg(long)]
    pub disc: Option<String>,

    /// Number of discs (must specify disc number)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub discs: Option<u32>,

    /// Merge multiple discs preserving disc and track numbering
    #[arg(long, conflicts_with = "nodiscs")]
    pub multidisc: bool,

    /// Ignore disc tags; all tracks are merged as one disc
    #[arg(long)]
    pub nodiscs: bool,

    /// Don't print metadata and ask before running
    #[arg(long)]
    pub no_confirm: bool,

    /// Produce only a CUE sheet
    #[arg(long)]
    pub cue: bool,

    /// Produce CUE+FLAC as output instead of MKA
    #[arg(long)]
    pub cueflac: bool,

    /// Skip merging of FLAC files, requires the merged file already exists
    #[arg(long)]
    pub skipmerge: bool,

    /// TOML file with tool locations and the default output directory
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Metadata overrides requested on the command line.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            album: self.album.clone(),
            artist: self.artist.clone(),
            genre: self.genre.clone(),
            year: self.year.clone(),
            label: self.label.clone(),
            issue_date: self.issuedate.clone(),
            version: self.version_tag.clone(),
            medium: self.medium.clone(),
            disc: self.disc.clone(),
            discs: self.discs,
            nodiscs: self.nodiscs,
            multidisc: self.multidisc,
            output: self.output.clone(),
        }
    }
}
