//! Matroska global tags (`--global-tags`) for the merged album.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::chapter_id::{ChapterIdPool, ChapterIds};
use crate::metadata::Metadata;
use crate::tags::{TagKey, Track};
use crate::xml::{XmlElement, write_document};

pub const TAGS_DTD: &str = "matroskatags.dtd";

/// Matroska `TargetTypeValue` levels.
pub mod target {
    pub const MULTI_DISC: &str = "60";
    pub const ALBUM: &str = "50";
    pub const TRACK: &str = "30";
}

/// Disc and side of a multidisc release, ordered numerically by disc.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct DiscKey {
    number: u32,
    side: String,
    disc: String,
}

impl DiscKey {
    fn of(track: &Track) -> Option<Self> {
        let disc = track.disc.as_deref()?.trim();
        Some(Self {
            number: leading_number(disc),
            side: track.side.clone().unwrap_or_default(),
            disc: disc.to_string(),
        })
    }

    fn id(&self) -> String {
        format!("{}{}", self.disc, self.side)
    }
}

fn leading_number(value: &str) -> u32 {
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

fn simple(tag: &mut XmlElement, name: &str, value: &str) {
    let simple = tag.push(XmlElement::new("Simple"));
    simple.push_text("Name", name);
    simple.push_text("String", value);
}

fn targeted(root: &mut XmlElement, level: &str, chapters: &[String]) -> usize {
    let mut tag = XmlElement::new("Tag");
    let targets = tag.push(XmlElement::new("Targets"));
    targets.push_text("TargetTypeValue", level);
    for uid in chapters {
        targets.push_text("ChapterUID", uid.as_str());
    }
    root.children.push(tag);
    root.children.len() - 1
}

/// Number of discs announced by the collection-level block.
fn disc_count(meta: &Metadata) -> u32 {
    if meta.is_multidisc() {
        meta.tracks
            .iter()
            .filter_map(|t| t.disc.as_deref())
            .map(leading_number)
            .max()
            .unwrap_or(meta.discs)
    } else {
        meta.discs
    }
}

/// Build the `<Tags>` tree. Track blocks reference chapters through `ids`.
pub fn build_tags(meta: &Metadata, ids: &ChapterIds<'_>) -> XmlElement {
    let mut root = XmlElement::new("Tags");

    let discs = disc_count(meta);
    if discs >= 2 {
        let at = targeted(&mut root, target::MULTI_DISC, &[]);
        simple(&mut root.children[at], TagKey::TotalParts.as_str(), &discs.to_string());
    }

    let at = targeted(&mut root, target::ALBUM, &[]);
    for (key, value) in meta.items() {
        simple(&mut root.children[at], key.as_str(), value);
    }

    if meta.is_multidisc() {
        let mut groups: BTreeMap<DiscKey, Vec<usize>> = BTreeMap::new();
        for (index, track) in meta.tracks.iter().enumerate() {
            if let Some(key) = DiscKey::of(track) {
                groups.entry(key).or_default().push(index);
            }
        }
        tracing::debug!(discs = groups.len(), "per-disc tag blocks");
        for (disc, chapters) in &groups {
            let uids: Vec<String> = chapters.iter().map(|&i| ids.uid(i as isize)).collect();
            let total = chapters
                .iter()
                .filter_map(|&i| meta.tracks[i].number())
                .max()
                .unwrap_or(0);
            let at = targeted(&mut root, target::ALBUM, &uids);
            let tag = &mut root.children[at];
            simple(tag, TagKey::PartNumber.as_str(), &disc.disc);
            simple(tag, TagKey::TotalParts.as_str(), &total.to_string());
            if let Some(name) = meta.disc_names().and_then(|names| names.get(&disc.id())) {
                simple(tag, TagKey::DiscName.as_str(), name);
            }
        }
    }

    let at = targeted(&mut root, target::TRACK, &[]);
    simple(&mut root.children[at], TagKey::Artist.as_str(), meta.get(TagKey::Artist));

    for (index, track) in meta.tracks.iter().enumerate() {
        let at = targeted(&mut root, target::TRACK, &[ids.uid(index as isize)]);
        let tag = &mut root.children[at];
        simple(tag, "TITLE", &track.title);
        simple(tag, "PART_NUMBER", &track.track);
        for (field, name) in [
            (&track.side, "SIDE"),
            (&track.subindex, "SUBINDEX"),
            (&track.subtitle, "SUBTITLE"),
            (&track.phase, "PHASE"),
        ] {
            if let Some(value) = field {
                simple(tag, name, value);
            }
        }
    }
    root
}

/// Write the tag document for `meta` to `path`.
pub fn write_tags(meta: &Metadata, pool: &mut ChapterIdPool, path: &Path) -> Result<()> {
    let ids = pool.ids(meta.tracks.len());
    write_document(path, &build_tags(meta, &ids), TAGS_DTD)
}
