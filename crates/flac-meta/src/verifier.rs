//! Checks that a set of FLAC files can be merged into one stream.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::source::{StreamInfo, TagReader};
use crate::tags::Channels;

pub const SAMPLE_RATES: [u32; 6] = [44_100, 48_000, 88_200, 96_000, 176_400, 192_000];
pub const BIT_DEPTHS: [u32; 2] = [16, 24];
pub const CHANNEL_COUNTS: [u32; 3] = [1, 2, 6];

/// Common format of a verified set of files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlacVerifier {
    sample_rate: u32,
    bits_per_sample: u32,
    channels: u32,
}

impl FlacVerifier {
    /// Verify that every file shares the supported format of the first one.
    pub fn verify(files: &[PathBuf], reader: &dyn TagReader) -> Result<Self> {
        let Some((first, rest)) = files.split_first() else {
            bail!("no FLAC files to verify");
        };
        let verifier = Self::load(first, &reader.read(first)?.stream)?;
        for file in rest {
            verifier.check(file, &reader.read(file)?.stream)?;
        }
        tracing::debug!(format = %verifier, files = files.len(), "verified FLAC format");
        Ok(verifier)
    }

    fn load(path: &Path, info: &StreamInfo) -> Result<Self> {
        if !SAMPLE_RATES.contains(&info.sample_rate) {
            bail!("invalid sample rate in {:?} of {}", path, info.sample_rate);
        }
        if !CHANNEL_COUNTS.contains(&info.channels) {
            bail!("invalid channels in {:?} of {}", path, info.channels);
        }
        if !BIT_DEPTHS.contains(&info.bits_per_sample) {
            bail!("invalid bit depth in {:?} of {}", path, info.bits_per_sample);
        }
        Ok(Self {
            sample_rate: info.sample_rate,
            bits_per_sample: info.bits_per_sample,
            channels: info.channels,
        })
    }

    fn check(&self, path: &Path, info: &StreamInfo) -> Result<()> {
        if info.sample_rate != self.sample_rate {
            bail!(
                "mismatched sample rate in {:?}, expected {} received {}",
                path,
                self.sample_rate,
                info.sample_rate
            );
        }
        if info.channels != self.channels {
            bail!(
                "mismatched channels in {:?}, expected {} received {}",
                path,
                self.channels,
                info.channels
            );
        }
        if info.bits_per_sample != self.bits_per_sample {
            bail!(
                "mismatched bit depth in {:?}, expected {} received {}",
                path,
                self.bits_per_sample,
                info.bits_per_sample
            );
        }
        Ok(())
    }

    pub fn is_cd(&self) -> bool {
        self.sample_rate == 44_100 && self.channels == 2 && self.bits_per_sample == 16
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    pub fn channels(&self) -> Channels {
        Channels::from_count(self.channels).unwrap_or_default()
    }
}

impl fmt::Display for FlacVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let khz = if self.sample_rate % 1000 == 0 {
            (self.sample_rate / 1000).to_string()
        } else {
            (self.sample_rate as f64 / 1000.0).to_string()
        };
        write!(
            f,
            "FLACVerifier<{khz}kHz {} {}-bit FLAC>",
            self.channels(),
            self.bits_per_sample
        )
    }
}
