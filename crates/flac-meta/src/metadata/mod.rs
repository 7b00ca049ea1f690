//! Album metadata gathered from FLAC tags or a CUE sheet.
//!
//! A [`Metadata`] is built in fixed phases: the source variant pulls tags
//! and tracks, the stream parameters fix the channel layout and HD format,
//! caller overrides are merged, and the result is validated and finalized.
//! Once built it is read-only input for the name generator and the
//! tag/chapter/CUE writers.

mod album;
mod cue;
mod multidisc;

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::ops::Index;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::MetadataError;
use crate::namegen::sanitize_filename;
use crate::prompt::{Prompt, accepts_by_default};
use crate::source::{AudioTags, StreamInfo, TagReader};
use crate::tags::{AlbumTags, Channels, DEFAULT_MEDIUM, MEDIUM_CHOICES, TagKey, Track};

pub use album::AlbumSource;
pub use cue::CueSource;
pub use multidisc::MultidiscSource;

const UNICODE_PLACEHOLDER: &str = "-- Unicode problems --";

/// Values supplied by the caller which win over anything read from files.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub album: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub label: Option<String>,
    /// Only applied when a label is known.
    pub issue_date: Option<String>,
    pub version: Option<String>,
    pub medium: Option<String>,
    pub disc: Option<String>,
    pub discs: Option<u32>,
    /// Treat the source as a single disc regardless of disc tags.
    pub nodiscs: bool,
    pub multidisc: bool,
    /// Output path; a path with an extension becomes the forced output filename.
    pub output: Option<PathBuf>,
}

impl Overrides {
    /// Forced output filename, if `output` names a file rather than a directory.
    pub fn output_file(&self) -> Option<&Path> {
        self.output
            .as_deref()
            .filter(|path| path.extension().is_some())
    }
}

/// Where a [`Metadata`] came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataSource {
    Files(Vec<PathBuf>),
    Cue(PathBuf),
}

impl MetadataSource {
    /// Directory holding the source files.
    pub fn directory(&self) -> PathBuf {
        let path = match self {
            MetadataSource::Files(files) => files.first().map(PathBuf::as_path),
            MetadataSource::Cue(cue) => Some(cue.as_path()),
        };
        path.and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    pub(crate) fn sorted_files(&self) -> Vec<PathBuf> {
        match self {
            MetadataSource::Files(files) => {
                let mut files = files.clone();
                files.sort();
                files
            }
            MetadataSource::Cue(_) => Vec::new(),
        }
    }
}

/// Which variant built the metadata, with any variant-only data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataKind {
    Album,
    /// Disc names keyed by disc id (`"1"`, `"1A"`), first seen wins.
    Multidisc { disc_names: BTreeMap<String, String> },
    Cue,
}

/// Phase hooks implemented by each metadata source.
pub trait MetadataVariant {
    fn kind(&self) -> MetadataKind;

    /// Pull album tags and the track list from the source.
    fn initialize(
        &self,
        meta: &mut Metadata,
        overrides: &Overrides,
        reader: &dyn TagReader,
    ) -> Result<()>;

    /// Tags of the file whose stream parameters describe the whole album.
    fn source_tags(&self, meta: &Metadata, reader: &dyn TagReader) -> Result<AudioTags>;

    /// Whether `TOTAL_PARTS` is derived from the track list.
    fn sumparts(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct Metadata {
    tags: AlbumTags,
    pub channels: Channels,
    pub discs: u32,
    pub tracks: Vec<Track>,
    pub source: MetadataSource,
    /// Audio file referenced by a CUE sheet, relative to the sheet.
    pub filename: Option<PathBuf>,
    /// Output name supplied by the caller, returned as-is by [`Metadata::output_filename`].
    pub forced_filename: Option<PathBuf>,
    pub stream: Option<StreamInfo>,
    kind: MetadataKind,
}

impl Metadata {
    /// Album or multidisc metadata for a list of FLAC files, depending on `overrides.multidisc`.
    pub fn from_files(
        files: &[PathBuf],
        overrides: &Overrides,
        reader: &dyn TagReader,
    ) -> Result<Self> {
        let source = MetadataSource::Files(files.to_vec());
        if overrides.multidisc {
            Self::build(&MultidiscSource, source, overrides, reader)
        } else {
            Self::build(&AlbumSource, source, overrides, reader)
        }
    }

    pub fn from_cue(cue: &Path, overrides: &Overrides, reader: &dyn TagReader) -> Result<Self> {
        Self::build(
            &CueSource,
            MetadataSource::Cue(cue.to_path_buf()),
            overrides,
            reader,
        )
    }

    pub fn build(
        variant: &dyn MetadataVariant,
        source: MetadataSource,
        overrides: &Overrides,
        reader: &dyn TagReader,
    ) -> Result<Self> {
        let mut meta = Metadata {
            tags: AlbumTags::default(),
            channels: Channels::default(),
            discs: 1,
            tracks: Vec::new(),
            source,
            filename: None,
            forced_filename: None,
            stream: None,
            kind: variant.kind(),
        };
        variant.initialize(&mut meta, overrides, reader)?;
        let stream = variant.source_tags(&meta, reader)?.stream;
        meta.pull_channels(&stream)?;
        meta.pull_hd_format(&stream);
        meta.stream = Some(stream);
        meta.merge_overrides(overrides);
        meta.validate()?;
        meta.finalize(variant.sumparts())?;

        // The final name is only known now; a source file carrying it is an
        // earlier merge of the same album and must not count as a track.
        if let MetadataSource::Files(files) = &meta.source {
            let kept: Vec<PathBuf> = files
                .iter()
                .filter(|path| !meta.is_merged_output(path))
                .cloned()
                .collect();
            if kept.len() < files.len() {
                tracing::debug!(
                    skipped = files.len() - kept.len(),
                    "rebuilding without merged output"
                );
                return Self::build(variant, MetadataSource::Files(kept), overrides, reader);
            }
        }
        Ok(meta)
    }

    pub fn kind(&self) -> &MetadataKind {
        &self.kind
    }

    pub fn is_multidisc(&self) -> bool {
        matches!(self.kind, MetadataKind::Multidisc { .. })
    }

    pub fn disc_names(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            MetadataKind::Multidisc { disc_names } => Some(disc_names),
            _ => None,
        }
    }

    pub(crate) fn disc_names_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        match &mut self.kind {
            MetadataKind::Multidisc { disc_names } => Some(disc_names),
            _ => None,
        }
    }

    pub fn get(&self, key: TagKey) -> &str {
        self.tags.get(key)
    }

    pub fn contains(&self, key: TagKey) -> bool {
        self.tags.contains(key)
    }

    pub fn set(&mut self, key: TagKey, value: impl Into<String>) {
        self.tags.set(key, value);
    }

    pub fn remove(&mut self, key: TagKey) -> Option<String> {
        self.tags.remove(key)
    }

    pub fn items(&self) -> impl Iterator<Item = (TagKey, &str)> + '_ {
        self.tags.items()
    }

    /// Absolute path of the audio file a CUE sheet refers to.
    pub fn audio_file(&self) -> Option<PathBuf> {
        let name = self.filename.as_ref()?;
        Some(self.source.directory().join(name))
    }

    fn pull_channels(&mut self, stream: &StreamInfo) -> Result<(), MetadataError> {
        self.channels = Channels::from_count(stream.channels)
            .ok_or(MetadataError::UnsupportedChannels(stream.channels))?;
        Ok(())
    }

    fn pull_hd_format(&mut self, stream: &StreamInfo) {
        if stream.is_cd() {
            return;
        }
        let rate = stream.sample_rate;
        let mut format = if rate % 1000 == 0 {
            (rate / 1000).to_string()
        } else {
            (rate as f64 / 1000.0).to_string()
        };
        format.push_str(&format!("/{}", stream.bits_per_sample));
        match self.channels {
            Channels::Surround51 => format.push_str(" 5.1"),
            Channels::Mono => format.push_str(" 1.0"),
            Channels::Stereo => {}
        }
        tracing::debug!(hd_format = %format, "non-CD stream");
        self.set(TagKey::HdFormat, format);
    }

    fn merge_overrides(&mut self, overrides: &Overrides) {
        let direct = [
            (TagKey::Title, &overrides.album),
            (TagKey::Artist, &overrides.artist),
            (TagKey::Genre, &overrides.genre),
            (TagKey::DateRecorded, &overrides.year),
            (TagKey::Label, &overrides.label),
            (TagKey::Version, &overrides.version),
            (TagKey::OriginalMedium, &overrides.medium),
        ];
        for (key, value) in direct {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                self.set(key, value);
            }
        }
        if let Some(issue_date) = overrides.issue_date.as_deref().filter(|v| !v.is_empty()) {
            if self.contains(TagKey::Label) {
                self.set(TagKey::IssueDate, issue_date);
            }
        }
        if let Some(disc) = overrides.disc.as_deref().filter(|v| !v.is_empty()) {
            self.set(TagKey::PartNumber, disc);
        }
        if let Some(discs) = overrides.discs {
            self.discs = discs;
        }
        if overrides.nodiscs {
            self.discs = 1;
            self.remove(TagKey::PartNumber);
        }
        if let Some(output) = overrides.output_file() {
            self.forced_filename = Some(output.to_path_buf());
        }
    }

    fn validate(&mut self) -> Result<(), MetadataError> {
        self.tags.normalize();
        if self.contains(TagKey::IssueDate) != self.contains(TagKey::Label) {
            tracing::debug!("label and issue date must be given together, dropping both");
            self.remove(TagKey::IssueDate);
            self.remove(TagKey::Label);
        }
        if self.discs == 0 {
            return Err(MetadataError::DiscConfiguration(
                "number of discs must be at least 1".into(),
            ));
        }
        if self.discs > 1 && !self.contains(TagKey::PartNumber) {
            return Err(MetadataError::DiscConfiguration(
                "number of discs is set but disc number not known".into(),
            ));
        }
        if self.contains(TagKey::PartNumber) && self.discs < 2 {
            return Err(MetadataError::DiscConfiguration(
                "disc number is set but number of discs is not known".into(),
            ));
        }
        if !self.contains(TagKey::OriginalMedium) {
            self.set(TagKey::OriginalMedium, DEFAULT_MEDIUM);
        }
        let medium = self.get(TagKey::OriginalMedium);
        if !MEDIUM_CHOICES.contains(&medium) {
            return Err(MetadataError::InvalidMedium {
                medium: medium.to_string(),
                choices: MEDIUM_CHOICES.join(", "),
            });
        }
        for key in TagKey::REQUIRED {
            if self.get(key).is_empty() {
                return Err(MetadataError::MissingField(key.description()));
            }
        }
        Ok(())
    }

    fn finalize(&mut self, sumparts: bool) -> Result<(), MetadataError> {
        tracing::debug!(sumparts, "finalizing metadata");
        if sumparts {
            let total = self
                .tracks
                .iter()
                .filter_map(Track::number)
                .max()
                .ok_or_else(|| MetadataError::NoTracks(self.source_label()))?;
            self.set(TagKey::TotalParts, total.to_string());
        } else {
            self.remove(TagKey::TotalParts);
        }

        let date = self.get(TagKey::DateRecorded);
        if !is_year(date) {
            tracing::debug!(date, "improper date found");
            let year = date
                .split(['-', '/', '.'])
                .find(|part| is_year(part))
                .map(str::to_string)
                .ok_or_else(|| MetadataError::InvalidDate(date.to_string()))?;
            tracing::debug!(%year, "found year");
            self.set(TagKey::DateRecorded, year);
        }
        Ok(())
    }

    fn source_label(&self) -> String {
        match &self.source {
            MetadataSource::Files(files) => format!("{} files", files.len()),
            MetadataSource::Cue(cue) => cue.display().to_string(),
        }
    }

    /// Canonical output name, `Artist - Year - Title (Version) (Disc N) Name (Label Date Medium Channels).wav`.
    pub fn output_filename(&self, directory: Option<&Path>) -> PathBuf {
        if let Some(forced) = &self.forced_filename {
            tracing::debug!(filename = %forced.display(), "forced output filename");
            return forced.clone();
        }

        let base = format!(
            "{} - {} - {}",
            self.get(TagKey::Artist),
            self.get(TagKey::DateRecorded),
            self.get(TagKey::Title)
        );
        let version = match self.get(TagKey::Version) {
            "" => String::new(),
            version => format!(" ({version})"),
        };

        let channels = match self.channels {
            Channels::Stereo => "",
            other => other.as_str(),
        };
        let medium = self.get(TagKey::OriginalMedium);
        let label = if medium == DEFAULT_MEDIUM {
            format!(
                "{} {} {}",
                self.get(TagKey::Label),
                self.get(TagKey::IssueDate),
                channels
            )
        } else {
            format!(
                "{} {} {} {}",
                self.get(TagKey::Label),
                self.get(TagKey::IssueDate),
                medium,
                channels
            )
        };
        let label = match label.trim() {
            "" => String::new(),
            label => format!(" ({label})"),
        };

        let disc = match self.get(TagKey::PartNumber) {
            "" => format!(" {}", self.get(TagKey::DiscName)),
            part => format!(" (Disc {part}) {}", self.get(TagKey::DiscName)),
        };

        let filename = sanitize_filename(&format!(
            "{base}{version}{}{label}.wav",
            disc.trim_end()
        ));
        match directory {
            Some(dir) => dir.join(filename),
            None => PathBuf::from(filename),
        }
    }

    /// Bordered album table followed by one line per track and the output name.
    pub fn listing(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.to_string().lines().map(str::to_string).collect();
        for (index, track) in self.tracks.iter().enumerate() {
            let mut line = vec![format!("File {:02}:", index + 1)];
            if let Some(disc) = &track.disc {
                line.push(format!("Disc {disc}"));
            }
            if let Some(side) = &track.side {
                line.push(format!("Side {side}"));
            }
            line.push(format!("Track {:<2}", track.track));
            if let Some(phase) = &track.phase {
                line.push(format!("Phase {phase}"));
            }
            if let Some(subindex) = &track.subindex {
                line.push(format!("Subindex {subindex}"));
            }
            line.push(format!("Time {}", track.start_time));
            line.push(format!("\"{}\"", track.display_title()));
            lines.push(line.join(" "));
        }
        let name = self.output_filename(None).with_extension("mka");
        lines.push(format!("Filename: {}", name.display()));
        if let Some(names) = self.disc_names() {
            for (disc, name) in names {
                lines.push(format!("Disc {disc} Name: {name}"));
            }
        }
        lines
    }

    /// Write [`Metadata::listing`]; a line that can't be written is replaced by a placeholder.
    pub fn print_listing(&self, out: &mut dyn Write) -> Result<()> {
        for line in self.listing() {
            if writeln!(out, "{line}").is_err() {
                tracing::warn!("failed to print metadata line");
                writeln!(out, "{UNICODE_PLACEHOLDER}").context("write metadata listing")?;
            }
        }
        out.flush().context("flush metadata listing")
    }

    /// Show the listing and ask to continue; anything but an answer starting with `n` is a yes.
    pub fn confirm(&self, out: &mut dyn Write, prompt: &mut dyn Prompt) -> Result<bool> {
        self.print_listing(out)?;
        let answer = prompt.ask("Continue [Y/n]? ")?;
        Ok(accepts_by_default(&answer))
    }
}

impl Index<TagKey> for Metadata {
    type Output = str;

    fn index(&self, key: TagKey) -> &str {
        self.get(key)
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows: Vec<(String, String)> = vec![
            ("Album Title".into(), self.get(TagKey::Title).into()),
            ("Album Artist".into(), self.get(TagKey::Artist).into()),
            ("Year".into(), self.get(TagKey::DateRecorded).into()),
            ("Genre".into(), self.get(TagKey::Genre).into()),
        ];
        for key in [
            TagKey::Label,
            TagKey::IssueDate,
            TagKey::OriginalMedium,
            TagKey::Version,
            TagKey::HdFormat,
            TagKey::DiscName,
        ] {
            if self.contains(key) {
                rows.push((key.label(), self.get(key).into()));
            }
        }
        if self.discs > 1 {
            rows.push(("Disc".into(), self.get(TagKey::PartNumber).into()));
            rows.push(("Discs".into(), self.discs.to_string()));
        }
        if self.channels != Channels::Stereo {
            rows.push(("Channels".into(), self.channels.to_string()));
        }

        let key_width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0) + 1;
        let lines: Vec<String> = rows
            .iter()
            .map(|(key, value)| {
                let dots = ".".repeat(key_width - key.chars().count());
                format!("{key}{dots}: {value}")
            })
            .collect();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let border = width + 4;

        writeln!(f, "{:=^border$}", " ALBUM INFORMATION ")?;
        for line in &lines {
            let pad = " ".repeat(width - line.chars().count());
            writeln!(f, "= {line}{pad} =")?;
        }
        write!(f, "{}", "=".repeat(border))
    }
}

fn is_year(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Read album-level tags shared by every file of a release.
pub(crate) fn album_level_tags(tags: &AudioTags, include_disc_name: bool) -> AlbumTags {
    let mut album = AlbumTags::default();
    let mut mapping = vec![
        (TagKey::Title, "ALBUM"),
        (TagKey::DateRecorded, "DATE"),
        (TagKey::Artist, "ARTIST"),
        (TagKey::Genre, "GENRE"),
        (TagKey::Label, "LABEL"),
        (TagKey::IssueDate, "ISSUE_DATE"),
        (TagKey::Version, "VERSION"),
        (TagKey::OriginalMedium, "ORIGINAL_MEDIUM"),
    ];
    if include_disc_name {
        mapping.push((TagKey::DiscName, "DISC_NAME"));
    }
    for (key, tag) in mapping {
        if let Some(value) = tags.get(tag) {
            tracing::debug!(key = %key, tag, value, "found album tag");
            album.set(key, value);
        }
    }
    album
}

impl Metadata {
    pub(crate) fn merge_album_tags(&mut self, album: AlbumTags) {
        for (key, value) in album.items() {
            self.tags.set(key, value);
        }
    }

    /// True when `path` is the merged output this metadata would produce.
    pub(crate) fn is_merged_output(&self, path: &Path) -> bool {
        let merged = self.output_filename(None);
        path.file_stem().is_some() && path.file_stem() == merged.file_stem()
    }
}
