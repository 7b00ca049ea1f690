use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{Metadata, MetadataKind, MetadataVariant, Overrides, album_level_tags};
use crate::error::MetadataError;
use crate::source::{AudioTags, TagReader};
use crate::tags::{TagKey, Track};
use crate::time::Timestamp;

/// Single-disc release made of one FLAC file per track.
///
/// Album tags come from the alphabetically first file. `DISCNUMBER` is used
/// only together with a `DISCTOTAL` above 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlbumSource;

impl MetadataVariant for AlbumSource {
    fn kind(&self) -> MetadataKind {
        MetadataKind::Album
    }

    fn initialize(
        &self,
        meta: &mut Metadata,
        overrides: &Overrides,
        reader: &dyn TagReader,
    ) -> Result<()> {
        if overrides.multidisc {
            return Err(MetadataError::WrongMode(
                "album metadata can't be built in multidisc mode",
            )
            .into());
        }
        let files = meta.source.sorted_files();
        let first = first_file(&files)?;
        let tags = reader.read(first)?;
        meta.merge_album_tags(album_level_tags(&tags, true));

        if let (Some(total), Some(number)) = (tags.get("DISCTOTAL"), tags.get("DISCNUMBER")) {
            let discs: u32 = total.trim().parse().map_err(|_| {
                MetadataError::DiscConfiguration(format!(
                    "DISCTOTAL {total:?} in {} is not a number",
                    first.display()
                ))
            })?;
            if discs > 1 {
                meta.set(TagKey::PartNumber, number);
                meta.discs = discs;
            }
        }

        read_tracks(meta, reader, &files, |_, _, _, _| Ok(()))
    }

    fn source_tags(&self, meta: &Metadata, reader: &dyn TagReader) -> Result<AudioTags> {
        let files = meta.source.sorted_files();
        reader.read(first_file(&files)?)
    }

    fn sumparts(&self) -> bool {
        true
    }
}

pub(super) fn first_file(files: &[PathBuf]) -> Result<&Path, MetadataError> {
    files
        .first()
        .map(PathBuf::as_path)
        .ok_or_else(|| MetadataError::NoTracks("an empty file list".into()))
}

/// Build one track per file in order, accumulating start times.
///
/// `extra` sees each track before it is stored and may fill variant fields.
pub(super) fn read_tracks<F>(
    meta: &mut Metadata,
    reader: &dyn TagReader,
    files: &[PathBuf],
    mut extra: F,
) -> Result<()>
where
    F: FnMut(&mut Metadata, &Path, &AudioTags, &mut Track) -> Result<()>,
{
    let mut start = Timestamp::ZERO;
    for path in files {
        if meta.is_merged_output(path) {
            tracing::debug!(path = %path.display(), "skipping merged output");
            continue;
        }
        let tags = reader.read(path)?;
        let title = tags.require(path, "TITLE")?;
        let number = tags.require(path, "TRACKNUMBER")?;
        let mut track = Track::new(title, number, start);
        for (field, tag) in [
            ("side", "SIDE"),
            ("subtitle", "SUBTITLE"),
            ("subindex", "SUBINDEX"),
            ("phase", "PHASE"),
        ] {
            if let Some(value) = tags.get(tag) {
                track.set_optional(field, value.to_string());
            }
        }
        extra(meta, path, &tags, &mut track)?;
        meta.tracks.push(track);
        start += tags.stream.duration();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeReader, cd_stream};

    fn tagged(n: u32) -> AudioTags {
        AudioTags::new(cd_stream(100))
            .with_tag("ALBUM", "Abbey Road")
            .with_tag("ARTIST", "The Beatles")
            .with_tag("GENRE", "Rock")
            .with_tag("DATE", "1969-09-26")
            .with_tag("DISC_NAME", "Side One")
            .with_tag("TITLE", format!("Track {n}"))
            .with_tag("TRACKNUMBER", n.to_string())
    }

    #[test]
    fn album_tags_come_from_first_sorted_file() {
        let mut reader = FakeReader::default();
        let b = PathBuf::from("/m/b.flac");
        let a = PathBuf::from("/m/a.flac");
        reader.add(&b, tagged(2).with_tag("LABEL", "Other"));
        reader.add(
            &a,
            tagged(1)
                .with_tag("LABEL", "Apple")
                .with_tag("ISSUE_DATE", "1987"),
        );
        let meta = Metadata::from_files(&[b, a], &Overrides::default(), &reader).unwrap();
        assert_eq!(&meta[TagKey::Title], "Abbey Road");
        assert_eq!(&meta[TagKey::DateRecorded], "1969");
        assert_eq!(&meta[TagKey::Label], "Apple");
        assert_eq!(&meta[TagKey::DiscName], "Side One");
        assert_eq!(meta.tracks[0].title, "Track 1");
        assert_eq!(meta.tracks[1].start_time.to_mka(), "00:01:40.000000000");
    }

    #[test]
    fn rejects_multidisc_mode() {
        let mut reader = FakeReader::default();
        let path = PathBuf::from("/m/a.flac");
        reader.add(&path, tagged(1));
        let overrides = Overrides {
            multidisc: true,
            ..Overrides::default()
        };
        let err = Metadata::build(
            &AlbumSource,
            crate::metadata::MetadataSource::Files(vec![path]),
            &overrides,
            &reader,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MetadataError>(),
            Some(MetadataError::WrongMode(_))
        ));
    }

    #[test]
    fn missing_track_number_names_the_file() {
        let mut reader = FakeReader::default();
        let path = PathBuf::from("/m/a.flac");
        reader.add(
            &path,
            AudioTags::new(cd_stream(5))
                .with_tag("ALBUM", "A")
                .with_tag("TITLE", "T"),
        );
        let err = Metadata::from_files(&[path], &Overrides::default(), &reader).unwrap_err();
        match err.downcast_ref::<MetadataError>() {
            Some(MetadataError::TagNotFound { path, tag }) => {
                assert_eq!(path, Path::new("/m/a.flac"));
                assert_eq!(tag, "TRACKNUMBER");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn single_disc_totals_are_ignored() {
        let mut reader = FakeReader::default();
        let path = PathBuf::from("/m/a.flac");
        reader.add(
            &path,
            tagged(1)
                .with_tag("DISCNUMBER", "1")
                .with_tag("DISCTOTAL", "1"),
        );
        let meta = Metadata::from_files(&[path], &Overrides::default(), &reader).unwrap();
        assert_eq!(meta.discs, 1);
        assert!(!meta.contains(TagKey::PartNumber));
    }

    #[test]
    fn optional_track_fields_are_kept() {
        let mut reader = FakeReader::default();
        let path = PathBuf::from("/m/a.flac");
        reader.add(
            &path,
            tagged(1)
                .with_tag("SIDE", "A")
                .with_tag("SUBTITLE", "Reprise")
                .with_tag("SUBINDEX", "2")
                .with_tag("PHASE", "Live"),
        );
        let meta = Metadata::from_files(&[path], &Overrides::default(), &reader).unwrap();
        let track = &meta.tracks[0];
        assert_eq!(track.side.as_deref(), Some("A"));
        assert_eq!(track.subtitle.as_deref(), Some("Reprise"));
        assert_eq!(track.subindex.as_deref(), Some("2"));
        assert_eq!(track.phase.as_deref(), Some("Live"));
        assert!(track.disc.is_none());
    }

    #[test]
    fn merged_output_is_not_a_track() {
        let mut reader = FakeReader::default();
        let first = PathBuf::from("/m/01.flac");
        let second = PathBuf::from("/m/02.flac");
        // Named after the finalized year, not the raw DATE tag.
        let merged = PathBuf::from("/m/The Beatles - 1969 - Abbey Road Side One.flac");
        reader.add(&first, tagged(1));
        reader.add(&second, tagged(2));
        reader.add(&merged, tagged(9));
        let files = [first, merged, second];
        let meta = Metadata::from_files(&files, &Overrides::default(), &reader).unwrap();
        assert_eq!(meta.tracks.len(), 2);
        assert_eq!(&meta[TagKey::TotalParts], "2");
        assert_eq!(meta.tracks[1].start_time.to_mka(), "00:01:40.000000000");
        assert_eq!(meta.source.sorted_files().len(), 2);
    }

    #[test]
    fn merged_output_named_by_overrides_is_not_a_track() {
        let mut reader = FakeReader::default();
        let track = PathBuf::from("/m/01.flac");
        let merged = PathBuf::from("/m/Beatles - 1969 - Abbey Road Side One.flac");
        reader.add(&track, tagged(1));
        reader.add(&merged, tagged(1));
        let overrides = Overrides {
            artist: Some("Beatles".into()),
            ..Overrides::default()
        };
        let meta = Metadata::from_files(&[track, merged], &overrides, &reader).unwrap();
        assert_eq!(meta.tracks.len(), 1);
        assert_eq!(&meta[TagKey::TotalParts], "1");
    }

    #[test]
    fn empty_file_list_has_no_tracks() {
        let reader = FakeReader::default();
        let err = Metadata::from_files(&[], &Overrides::default(), &reader).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MetadataError>(),
            Some(MetadataError::NoTracks(_))
        ));
    }
}
