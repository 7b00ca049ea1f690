//! Read access to FLAC tags and stream parameters.
//!
//! Everything above this module sees audio files only through [`TagReader`],
//! so metadata construction can be exercised without real FLAC files.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardVisualKey};
use symphonia::core::probe::Hint;

use crate::error::MetadataError;
use crate::time::Timestamp;

/// Technical parameters of an audio stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    pub channels: u32,
    /// Total sample frames (samples per channel).
    pub total_frames: u64,
}

impl StreamInfo {
    pub fn duration(&self) -> Timestamp {
        Timestamp::from_samples(self.total_frames, self.sample_rate)
    }

    pub fn is_cd(&self) -> bool {
        self.sample_rate == 44_100 && self.bits_per_sample == 16 && self.channels == 2
    }
}

/// Vorbis comments of one file plus its stream parameters.
///
/// Keys are stored upper-cased; when a key repeats, the first value wins.
#[derive(Clone, Debug)]
pub struct AudioTags {
    tags: BTreeMap<String, String>,
    pub stream: StreamInfo,
}

impl AudioTags {
    pub fn new(stream: StreamInfo) -> Self {
        Self {
            tags: BTreeMap::new(),
            stream,
        }
    }

    pub fn with_tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.tags
            .entry(key.to_ascii_uppercase())
            .or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(&key.to_ascii_uppercase()).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Look up a tag which must be present on `path`.
    pub fn require(&self, path: &Path, key: &str) -> Result<&str, MetadataError> {
        self.get(key)
            .ok_or_else(|| MetadataError::tag_not_found(path, key))
    }
}

#[derive(Clone, Debug)]
pub struct EmbeddedPicture {
    pub mime_type: String,
    pub data: Vec<u8>,
}

pub trait TagReader {
    fn read(&self, path: &Path) -> Result<AudioTags>;

    /// Front cover (or first picture) embedded in `path`, if any.
    fn front_cover(&self, path: &Path) -> Result<Option<EmbeddedPicture>>;
}

/// [`TagReader`] backed by a Symphonia probe of the file.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaReader;

impl SymphoniaReader {
    fn probe(path: &Path) -> Result<symphonia::core::probe::ProbeResult> {
        let file = File::open(path).with_context(|| format!("open {:?}", path))?;
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .with_context(|| format!("probe {:?}", path))
    }
}

impl TagReader for SymphoniaReader {
    fn read(&self, path: &Path) -> Result<AudioTags> {
        let mut probed = Self::probe(path)?;
        let stream = {
            let track = probed
                .format
                .default_track()
                .ok_or_else(|| anyhow!("no audio track in {:?}", path))?;
            let params = &track.codec_params;
            StreamInfo {
                sample_rate: params
                    .sample_rate
                    .ok_or_else(|| anyhow!("unknown sample rate in {:?}", path))?,
                bits_per_sample: params
                    .bits_per_sample
                    .ok_or_else(|| anyhow!("unknown bit depth in {:?}", path))?,
                channels: params
                    .channels
                    .map(|c| c.count() as u32)
                    .ok_or_else(|| anyhow!("unknown channel layout in {:?}", path))?,
                total_frames: params
                    .n_frames
                    .ok_or_else(|| anyhow!("unknown length of {:?}", path))?,
            }
        };

        let mut tags = AudioTags::new(stream);
        if let Some(rev) = probed.format.metadata().current() {
            collect_tags(rev, &mut tags);
        }
        tracing::debug!(path = %path.display(), ?stream, "read FLAC tags");
        Ok(tags)
    }

    fn front_cover(&self, path: &Path) -> Result<Option<EmbeddedPicture>> {
        let mut probed = Self::probe(path)?;
        let metadata = probed.format.metadata();
        let Some(rev) = metadata.current() else {
            return Ok(None);
        };
        let visuals = rev.visuals();
        let visual = visuals
            .iter()
            .find(|v| v.usage == Some(StandardVisualKey::FrontCover))
            .or_else(|| visuals.first());
        Ok(visual.map(|v| EmbeddedPicture {
            mime_type: v.media_type.clone(),
            data: v.data.to_vec(),
        }))
    }
}

fn collect_tags(rev: &MetadataRevision, tags: &mut AudioTags) {
    for tag in rev.tags() {
        tags.insert(&tag.key, tag.value.to_string());
    }
}
