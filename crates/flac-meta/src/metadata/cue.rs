use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{Metadata, MetadataKind, MetadataSource, MetadataVariant, Overrides};
use crate::error::MetadataError;
use crate::source::{AudioTags, TagReader};
use crate::tags::{TagKey, Track};
use crate::time::Timestamp;

/// Top-level CUE prefixes and the tag each one fills. First match wins,
/// and `REM DISC ` keeps its trailing space so `REM DISCID` is not taken.
const TOP_LEVEL: [(&str, TagKey); 10] = [
    ("REM DATE", TagKey::DateRecorded),
    ("REM DISC ", TagKey::PartNumber),
    ("PERFORMER", TagKey::Artist),
    ("TITLE", TagKey::Title),
    ("REM GENRE", TagKey::Genre),
    ("REM ISSUE_DATE", TagKey::IssueDate),
    ("REM LABEL", TagKey::Label),
    ("REM VERSION", TagKey::Version),
    ("REM ORIGINAL_MEDIUM", TagKey::OriginalMedium),
    ("REM DISC_NAME", TagKey::DiscName),
];

/// CUE sheet describing a single audio file.
#[derive(Clone, Copy, Debug, Default)]
pub struct CueSource;

impl CueSource {
    fn cue_path(meta: &Metadata) -> Result<&Path, MetadataError> {
        match &meta.source {
            MetadataSource::Cue(path) => Ok(path),
            MetadataSource::Files(_) => Err(MetadataError::WrongMode(
                "CUE metadata needs a CUE sheet as its source",
            )),
        }
    }
}

impl MetadataVariant for CueSource {
    fn kind(&self) -> MetadataKind {
        MetadataKind::Cue
    }

    fn initialize(
        &self,
        meta: &mut Metadata,
        _overrides: &Overrides,
        reader: &dyn TagReader,
    ) -> Result<()> {
        let cue = Self::cue_path(meta)?.to_path_buf();
        let text =
            std::fs::read_to_string(&cue).with_context(|| format!("read {:?}", cue))?;
        let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();

        for (i, line) in lines.iter().enumerate() {
            if line.starts_with("FILE") {
                let name = extract_filename(line);
                meta.filename = Some(PathBuf::from(swap_wav_for_flac(&name)));
            } else if line.starts_with("REM DISCS") {
                let value = extract_property(line, "REM DISCS");
                meta.discs = value.parse().map_err(|_| {
                    MetadataError::CueFormat(format!("REM DISCS {value:?} is not a number"))
                })?;
            } else if line.starts_with("  TRACK") {
                meta.tracks.push(parse_track(&cue, &lines[i..])?);
            } else if !line.starts_with(' ') {
                if let Some((prefix, key)) = TOP_LEVEL.iter().find(|(p, _)| line.starts_with(p)) {
                    meta.set(*key, extract_property(line, prefix));
                }
            }
        }

        if meta.filename.is_none() {
            return Err(MetadataError::CueFormat(format!(
                "{} has no FILE line",
                cue.display()
            ))
            .into());
        }

        let tags = self.source_tags(meta, reader)?;
        for key in [TagKey::Title, TagKey::Artist, TagKey::Genre] {
            if !meta.contains(key) {
                if let Some(value) = tags.get(key.as_str()) {
                    meta.set(key, value);
                }
            }
        }
        if !meta.contains(TagKey::DateRecorded) {
            if let Some(date) = tags.get("DATE") {
                meta.set(TagKey::DateRecorded, date);
            }
        }
        Ok(())
    }

    fn source_tags(&self, meta: &Metadata, reader: &dyn TagReader) -> Result<AudioTags> {
        let audio = meta.audio_file().ok_or_else(|| {
            MetadataError::CueFormat("CUE sheet doesn't reference an audio file".into())
        })?;
        reader.read(&audio)
    }

    fn sumparts(&self) -> bool {
        true
    }
}

/// Value of a `NAME "value"` line with the quotes removed.
fn extract_property(line: &str, name: &str) -> String {
    let rest = line.trim_start();
    let rest = rest.strip_prefix(name).unwrap_or(rest);
    rest.replace('"', "").trim().to_string()
}

/// File name of a `FILE "name.wav" WAVE` line, without the trailing file type.
fn extract_filename(line: &str) -> String {
    let value = extract_property(line, "FILE");
    match value.rsplit_once(' ') {
        Some((name, _kind)) => name.to_string(),
        None => value,
    }
}

fn swap_wav_for_flac(name: &str) -> String {
    match name.strip_suffix(".wav") {
        Some(stem) => format!("{stem}.flac"),
        None => name.to_string(),
    }
}

/// Parse the `  TRACK` block starting at `lines[0]`.
///
/// The block runs over the following four-space indented lines.
fn parse_track(cue: &Path, lines: &[&str]) -> Result<Track, MetadataError> {
    let header = extract_property(lines[0], "TRACK");
    let number = header.split_whitespace().next().unwrap_or("");
    let number = match number.trim_start_matches('0') {
        "" if !number.is_empty() => "0",
        stripped => stripped,
    };

    let mut title = None;
    let mut fields = BTreeMap::new();
    let mut times = BTreeMap::new();
    for line in lines.iter().skip(1) {
        if !line.starts_with("    ") {
            break;
        }
        let line = line.trim();
        if line.starts_with("PERFORMER") {
            continue;
        }
        let line = line.strip_prefix("REM ").unwrap_or(line);
        if let Some(index) = line.strip_prefix("INDEX ") {
            let (which, code) = index.split_once(' ').unwrap_or((index, ""));
            let code = code.trim();
            if code.is_empty() {
                continue;
            }
            let start = Timestamp::from_cue(code)
                .map_err(|e| MetadataError::CueFormat(e.to_string()))?;
            times.insert(which.to_string(), start);
            continue;
        }
        let name = line.split(' ').next().unwrap_or("");
        let value = extract_property(line, name);
        if value.is_empty() {
            continue;
        }
        match name.to_ascii_lowercase().as_str() {
            "title" => title = Some(value),
            other => {
                fields.insert(other.to_string(), value);
            }
        }
    }

    let start = times
        .get("01")
        .or_else(|| times.get("00"))
        .copied()
        .ok_or_else(|| {
            MetadataError::CueFormat(format!("no valid time codes found for track {number}"))
        })?;
    let title = title.ok_or_else(|| MetadataError::tag_not_found(cue, "TITLE"))?;

    let mut track = Track::new(title, number, start);
    for (name, value) in fields {
        track.set_optional(&name, value);
    }
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeReader, TempDir, cd_stream, stream};

    const SHEET: &str = "REM GENRE \"Jazz\"\r
REM DATE 1959\r
REM DISCID 6E0A3B09\r
REM DISCS \"2\"\r
REM DISC \"1\"\r
PERFORMER \"Miles Davis\"\r
TITLE \"Kind of Blue\"\r
FILE \"Kind of Blue.wav\" WAVE\r
  TRACK 01 AUDIO\r
    TITLE \"So What\"\r
    PERFORMER \"Miles Davis\"\r
    INDEX 01 00:00:00\r
  TRACK 02 AUDIO\r
    TITLE \"Freddie Freeloader\"\r
    REM SUBTITLE \"Take 3\"\r
    INDEX 00 03:28:50\r
    INDEX 01 03:30:00\r
";

    fn write_sheet(dir: &TempDir, text: &str) -> PathBuf {
        let cue = dir.path().join("album.cue");
        std::fs::write(&cue, text).unwrap();
        cue
    }

    fn reader_for(dir: &TempDir, tags: AudioTags) -> FakeReader {
        let mut reader = FakeReader::default();
        reader.add(&dir.path().join("Kind of Blue.flac"), tags);
        reader
    }

    #[test]
    fn parses_two_disc_sheet() {
        let dir = TempDir::new("cue-two-disc");
        let cue = write_sheet(&dir, SHEET);
        let reader = reader_for(&dir, AudioTags::new(cd_stream(600)));
        let meta = Metadata::from_cue(&cue, &Overrides::default(), &reader).unwrap();

        assert_eq!(meta.discs, 2);
        assert_eq!(&meta[TagKey::PartNumber], "1");
        assert_eq!(&meta[TagKey::Artist], "Miles Davis");
        assert_eq!(&meta[TagKey::Genre], "Jazz");
        assert_eq!(&meta[TagKey::DateRecorded], "1959");
        assert_eq!(&meta[TagKey::TotalParts], "2");
        assert_eq!(meta.filename, Some(PathBuf::from("Kind of Blue.flac")));
        assert_eq!(meta.tracks.len(), 2);
        assert_eq!(meta.tracks[0].track, "1");
        assert_eq!(meta.tracks[0].start_time.to_mka(), "00:00:00.000000000");
        assert_eq!(meta.tracks[1].start_time.to_mka(), "00:03:30.000000000");
        assert_eq!(meta.tracks[1].subtitle.as_deref(), Some("Take 3"));
        assert_eq!(
            meta.output_filename(None),
            PathBuf::from("Miles Davis - 1959 - Kind of Blue (Disc 1).wav")
        );
    }

    #[test]
    fn missing_top_level_tags_come_from_audio_file() {
        let dir = TempDir::new("cue-backfill");
        let cue = write_sheet(
            &dir,
            "FILE \"Kind of Blue.wav\" WAVE\n  TRACK 01 AUDIO\n    TITLE \"So What\"\n    INDEX 01 00:00:00\n",
        );
        let tags = AudioTags::new(stream(96_000, 24, 2))
            .with_tag("TITLE", "Kind of Blue")
            .with_tag("ARTIST", "Miles Davis")
            .with_tag("GENRE", "Jazz")
            .with_tag("DATE", "1959-03-02");
        let reader = reader_for(&dir, tags);
        let meta = Metadata::from_cue(&cue, &Overrides::default(), &reader).unwrap();
        assert_eq!(&meta[TagKey::Title], "Kind of Blue");
        assert_eq!(&meta[TagKey::DateRecorded], "1959");
        assert_eq!(&meta[TagKey::HdFormat], "96/24");
        assert_eq!(meta.discs, 1);
    }

    #[test]
    fn pregap_index_is_used_without_index_one() {
        let dir = TempDir::new("cue-pregap");
        let cue = write_sheet(
            &dir,
            "PERFORMER \"A\"\nTITLE \"B\"\nREM GENRE C\nREM DATE 2001\nFILE \"Kind of Blue.wav\" WAVE\n  TRACK 07 AUDIO\n    TITLE \"T\"\n    INDEX 00 01:00:00\n    INDEX 02 02:00:00\n",
        );
        let reader = reader_for(&dir, AudioTags::new(cd_stream(600)));
        let meta = Metadata::from_cue(&cue, &Overrides::default(), &reader).unwrap();
        assert_eq!(meta.tracks[0].track, "7");
        assert_eq!(meta.tracks[0].start_time.to_mka(), "00:01:00.000000000");
        assert_eq!(&meta[TagKey::TotalParts], "7");
    }

    #[test]
    fn track_without_index_is_a_format_error() {
        let dir = TempDir::new("cue-no-index");
        let cue = write_sheet(
            &dir,
            "FILE \"Kind of Blue.wav\" WAVE\n  TRACK 01 AUDIO\n    TITLE \"T\"\n    INDEX 02 00:10:00\n",
        );
        let reader = reader_for(&dir, AudioTags::new(cd_stream(600)));
        let err = Metadata::from_cue(&cue, &Overrides::default(), &reader).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MetadataError>(),
            Some(MetadataError::CueFormat(_))
        ));
    }

    #[test]
    fn sheet_without_file_line_is_rejected() {
        let dir = TempDir::new("cue-no-file");
        let cue = write_sheet(&dir, "PERFORMER \"A\"\n");
        let reader = FakeReader::default();
        let err = Metadata::from_cue(&cue, &Overrides::default(), &reader).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MetadataError>(),
            Some(MetadataError::CueFormat(_))
        ));
    }

    #[test]
    fn property_and_filename_extraction() {
        assert_eq!(extract_property("PERFORMER \"A B\"  ", "PERFORMER"), "A B");
        assert_eq!(extract_property("REM DATE 1999", "REM DATE"), "1999");
        assert_eq!(
            extract_filename("FILE \"My Album.wav\" WAVE"),
            "My Album.wav"
        );
        assert_eq!(swap_wav_for_flac("My Album.wav"), "My Album.flac");
        assert_eq!(swap_wav_for_flac("My Album.flac"), "My Album.flac");
    }
}
