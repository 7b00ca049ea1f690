//! Tag vocabulary shared by the metadata model and its writers.

use std::fmt;

use crate::time::Timestamp;

/// Album-level tag keys, in the order they are written out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKey {
    Title,
    Artist,
    Genre,
    DateRecorded,
    Label,
    IssueDate,
    Version,
    OriginalMedium,
    DiscName,
    PartNumber,
    HdFormat,
    TotalParts,
}

impl TagKey {
    pub const ALL: [TagKey; 12] = [
        TagKey::Title,
        TagKey::Artist,
        TagKey::Genre,
        TagKey::DateRecorded,
        TagKey::Label,
        TagKey::IssueDate,
        TagKey::Version,
        TagKey::OriginalMedium,
        TagKey::DiscName,
        TagKey::PartNumber,
        TagKey::HdFormat,
        TagKey::TotalParts,
    ];

    pub const REQUIRED: [TagKey; 4] = [
        TagKey::Title,
        TagKey::Artist,
        TagKey::Genre,
        TagKey::DateRecorded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagKey::Title => "TITLE",
            TagKey::Artist => "ARTIST",
            TagKey::Genre => "GENRE",
            TagKey::DateRecorded => "DATE_RECORDED",
            TagKey::Label => "LABEL",
            TagKey::IssueDate => "ISSUE_DATE",
            TagKey::Version => "VERSION",
            TagKey::OriginalMedium => "ORIGINAL_MEDIUM",
            TagKey::DiscName => "DISC_NAME",
            TagKey::PartNumber => "PART_NUMBER",
            TagKey::HdFormat => "HD_FORMAT",
            TagKey::TotalParts => "TOTAL_PARTS",
        }
    }

    pub fn from_name(name: &str) -> Option<TagKey> {
        TagKey::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// Human label used in the confirmation table, e.g. `Issue Date`.
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Short description used when a required tag is missing.
    pub fn description(&self) -> &'static str {
        match self {
            TagKey::Title => "title",
            TagKey::Artist => "artist",
            TagKey::Genre => "genre",
            TagKey::DateRecorded => "year",
            _ => self.as_str(),
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed record of album-level tags. Absent tags read as `""`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlbumTags {
    title: Option<String>,
    artist: Option<String>,
    genre: Option<String>,
    date_recorded: Option<String>,
    label: Option<String>,
    issue_date: Option<String>,
    version: Option<String>,
    original_medium: Option<String>,
    disc_name: Option<String>,
    part_number: Option<String>,
    hd_format: Option<String>,
    total_parts: Option<String>,
}

impl AlbumTags {
    fn slot(&self, key: TagKey) -> &Option<String> {
        match key {
            TagKey::Title => &self.title,
            TagKey::Artist => &self.artist,
            TagKey::Genre => &self.genre,
            TagKey::DateRecorded => &self.date_recorded,
            TagKey::Label => &self.label,
            TagKey::IssueDate => &self.issue_date,
            TagKey::Version => &self.version,
            TagKey::OriginalMedium => &self.original_medium,
            TagKey::DiscName => &self.disc_name,
            TagKey::PartNumber => &self.part_number,
            TagKey::HdFormat => &self.hd_format,
            TagKey::TotalParts => &self.total_parts,
        }
    }

    fn slot_mut(&mut self, key: TagKey) -> &mut Option<String> {
        match key {
            TagKey::Title => &mut self.title,
            TagKey::Artist => &mut self.artist,
            TagKey::Genre => &mut self.genre,
            TagKey::DateRecorded => &mut self.date_recorded,
            TagKey::Label => &mut self.label,
            TagKey::IssueDate => &mut self.issue_date,
            TagKey::Version => &mut self.version,
            TagKey::OriginalMedium => &mut self.original_medium,
            TagKey::DiscName => &mut self.disc_name,
            TagKey::PartNumber => &mut self.part_number,
            TagKey::HdFormat => &mut self.hd_format,
            TagKey::TotalParts => &mut self.total_parts,
        }
    }

    pub fn get(&self, key: TagKey) -> &str {
        self.slot(key).as_deref().unwrap_or("")
    }

    pub fn contains(&self, key: TagKey) -> bool {
        self.slot(key).is_some()
    }

    pub fn set(&mut self, key: TagKey, value: impl Into<String>) {
        *self.slot_mut(key) = Some(value.into());
    }

    pub fn remove(&mut self, key: TagKey) -> Option<String> {
        self.slot_mut(key).take()
    }

    /// Present tags in [`TagKey::ALL`] order.
    pub fn items(&self) -> impl Iterator<Item = (TagKey, &str)> + '_ {
        TagKey::ALL
            .into_iter()
            .filter_map(|key| self.slot(key).as_deref().map(|value| (key, value)))
    }

    /// Trim every value; optional tags left empty are dropped.
    pub(crate) fn normalize(&mut self) {
        for key in TagKey::ALL {
            let slot = self.slot_mut(key);
            if let Some(value) = slot.take() {
                let trimmed = value.trim();
                if !trimmed.is_empty() || TagKey::REQUIRED.contains(&key) {
                    *slot = Some(trimmed.to_string());
                }
            }
        }
    }
}

pub const MEDIUM_CHOICES: [&str; 24] = [
    "CD",
    "SACD",
    "DVD",
    "DVD-A",
    "Blu-ray",
    "Web",
    "Vinyl",
    "78RPM Vinyl",
    "LP",
    "Vinyl LP",
    "45RPM Vinyl LP",
    "EP",
    "Vinyl EP",
    "45RPM Vinyl EP",
    "180g Vinyl LP",
    "180g 45RPM Vinyl LP",
    "200g Vinyl LP",
    "200g 45RPM Vinyl LP",
    "220g Vinyl LP",
    "220g 45RPM Vinyl LP",
    "Reel-to-reel",
    "8-Track",
    "Cassette",
    "VHS",
];

pub const DEFAULT_MEDIUM: &str = "CD";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Channels {
    Mono,
    #[default]
    Stereo,
    Surround51,
}

impl Channels {
    pub fn from_count(count: u32) -> Option<Channels> {
        match count {
            1 => Some(Channels::Mono),
            2 => Some(Channels::Stereo),
            6 => Some(Channels::Surround51),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channels::Mono => "1.0",
            Channels::Stereo => "2.0",
            Channels::Surround51 => "5.1",
        }
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chapter of the merged output: a source file or a CUE `TRACK` block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    /// 1-based position as written in the source, digits only.
    pub track: String,
    pub start_time: Timestamp,
    pub disc: Option<String>,
    pub side: Option<String>,
    pub subindex: Option<String>,
    pub subtitle: Option<String>,
    pub phase: Option<String>,
}

impl Track {
    pub fn new(title: impl Into<String>, track: impl Into<String>, start_time: Timestamp) -> Self {
        Self {
            title: title.into(),
            track: track.into(),
            start_time,
            disc: None,
            side: None,
            subindex: None,
            subtitle: None,
            phase: None,
        }
    }

    /// Numeric track position; a `TRACKNUMBER` of `3/10` reads as 3.
    pub fn number(&self) -> Option<u32> {
        let track = self.track.trim();
        let track = track.split_once('/').map_or(track, |(n, _)| n);
        track.trim().parse().ok()
    }

    /// Title with the subtitle appended as `title: subtitle`.
    pub fn display_title(&self) -> String {
        match &self.subtitle {
            Some(subtitle) => format!("{}: {}", self.title, subtitle),
            None => self.title.clone(),
        }
    }

    /// Disc identifier: disc number followed by the side letter, e.g. `1A`.
    pub fn disc_id(&self) -> Option<String> {
        let disc = self.disc.as_deref()?;
        Some(format!("{}{}", disc, self.side.as_deref().unwrap_or("")))
    }

    /// Optional per-track fields under their lower-case tag names.
    pub fn optional_fields(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("disc", self.disc.as_deref()),
            ("side", self.side.as_deref()),
            ("subindex", self.subindex.as_deref()),
            ("subtitle", self.subtitle.as_deref()),
            ("phase", self.phase.as_deref()),
        ]
    }

    pub(crate) fn set_optional(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "disc" => &mut self.disc,
            "side" => &mut self.side,
            "subindex" => &mut self.subindex,
            "subtitle" => &mut self.subtitle,
            "phase" => &mut self.phase,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_tags_read_as_empty() {
        let mut tags = AlbumTags::default();
        assert_eq!(tags.get(TagKey::Label), "");
        assert!(!tags.contains(TagKey::Label));
        tags.set(TagKey::Label, "Blue Note");
        assert_eq!(tags.get(TagKey::Label), "Blue Note");
        assert_eq!(tags.remove(TagKey::Label).as_deref(), Some("Blue Note"));
        assert!(tags.remove(TagKey::Label).is_none());
    }

    #[test]
    fn items_follow_canonical_order() {
        let mut tags = AlbumTags::default();
        tags.set(TagKey::TotalParts, "9");
        tags.set(TagKey::Artist, "A");
        tags.set(TagKey::Title, "T");
        let keys: Vec<_> = tags.items().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["TITLE", "ARTIST", "TOTAL_PARTS"]);
    }

    #[test]
    fn normalize_trims_and_drops_empty_optionals() {
        let mut tags = AlbumTags::default();
        tags.set(TagKey::Title, "  Kind of Blue ");
        tags.set(TagKey::Version, "   ");
        tags.set(TagKey::Genre, "");
        tags.normalize();
        assert_eq!(tags.get(TagKey::Title), "Kind of Blue");
        assert!(!tags.contains(TagKey::Version));
        assert!(tags.contains(TagKey::Genre));
    }

    #[test]
    fn key_names_and_labels() {
        assert_eq!(TagKey::from_name("ISSUE_DATE"), Some(TagKey::IssueDate));
        assert_eq!(TagKey::from_name("DISCID"), None);
        assert_eq!(TagKey::IssueDate.label(), "Issue Date");
        assert_eq!(TagKey::HdFormat.label(), "Hd Format");
    }

    #[test]
    fn track_helpers() {
        let mut track = Track::new("Side Piece", "03", Timestamp::ZERO);
        assert_eq!(track.number(), Some(3));
        assert_eq!(Track::new("x", "4/12", Timestamp::ZERO).number(), Some(4));
        assert_eq!(track.disc_id(), None);
        track.disc = Some("1".into());
        track.side = Some("B".into());
        assert_eq!(track.disc_id().as_deref(), Some("1B"));
        assert!(track.set_optional("subtitle", "Live".into()));
        assert!(!track.set_optional("isrc", "X".into()));
        assert_eq!(track.display_title(), "Side Piece: Live");
    }

    #[test]
    fn channel_counts() {
        assert_eq!(Channels::from_count(6), Some(Channels::Surround51));
        assert_eq!(Channels::from_count(4), None);
        assert_eq!(Channels::default().to_string(), "2.0");
    }
}
