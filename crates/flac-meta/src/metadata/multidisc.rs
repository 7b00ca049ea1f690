use std::collections::BTreeMap;

use anyhow::Result;

use super::album::{first_file, read_tracks};
use super::{Metadata, MetadataKind, MetadataVariant, Overrides, album_level_tags};
use crate::error::MetadataError;
use crate::source::{AudioTags, TagReader};

/// Release spanning several discs, one FLAC file per track.
///
/// Every file must carry `DISCNUMBER`. `DISC_NAME` is kept per disc (and
/// side) rather than at album level.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultidiscSource;

impl MetadataVariant for MultidiscSource {
    fn kind(&self) -> MetadataKind {
        MetadataKind::Multidisc {
            disc_names: BTreeMap::new(),
        }
    }

    fn initialize(
        &self,
        meta: &mut Metadata,
        overrides: &Overrides,
        reader: &dyn TagReader,
    ) -> Result<()> {
        if !overrides.multidisc {
            return Err(MetadataError::WrongMode(
                "multidisc metadata requires multidisc mode",
            )
            .into());
        }
        let files = meta.source.sorted_files();
        let tags = reader.read(first_file(&files)?)?;
        meta.merge_album_tags(album_level_tags(&tags, false));

        read_tracks(meta, reader, &files, |meta, path, tags, track| {
            track.disc = Some(tags.require(path, "DISCNUMBER")?.to_string());
            if let (Some(id), Some(name)) = (track.disc_id(), tags.get("DISC_NAME")) {
                if let Some(names) = meta.disc_names_mut() {
                    names.entry(id).or_insert_with(|| name.to_string());
                }
            }
            Ok(())
        })
    }

    fn source_tags(&self, meta: &Metadata, reader: &dyn TagReader) -> Result<AudioTags> {
        let files = meta.source.sorted_files();
        reader.read(first_file(&files)?)
    }

    fn sumparts(&self) -> bool {
        false
    }
}
