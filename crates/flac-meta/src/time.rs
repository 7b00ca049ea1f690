//! CUE and Matroska time codes.
//!
//! Positions are held as whole nanoseconds so that Matroska codes
//! (`HH:MM:SS.fffffffff`) are exact and CUE codes (`MM:SS:FF`, 75 frames
//! per second) survive a round trip through the Matroska form.

use std::fmt;
use std::ops::{Add, AddAssign};

use thiserror::Error;

pub const CUE_FRAMES_PER_SECOND: u64 = 75;
const NANOS_PER_SECOND: u64 = 1_000_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeCodeError {
    #[error("malformed CUE time code {0:?}, expected MM:SS:FF")]
    Cue(String),
    #[error("malformed Matroska time code {0:?}, expected HH:MM:SS.fffffffff")]
    Matroska(String),
}

/// Offset into the merged audio stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    nanos: u64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { nanos: 0 };

    pub fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    pub fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Length of `frames` samples at `sample_rate` Hz, truncated to the nanosecond.
    pub fn from_samples(frames: u64, sample_rate: u32) -> Self {
        if sample_rate == 0 {
            return Self::ZERO;
        }
        let nanos = frames as u128 * NANOS_PER_SECOND as u128 / sample_rate as u128;
        Self {
            nanos: nanos as u64,
        }
    }

    /// `None` when the position does not fit in nanoseconds.
    fn from_cue_frames(frames: u64) -> Option<Self> {
        // Round to the nearest nanosecond; a frame is 13_333_333.3 ns.
        let nanos = (frames as u128 * NANOS_PER_SECOND as u128 + CUE_FRAMES_PER_SECOND as u128 / 2)
            / CUE_FRAMES_PER_SECOND as u128;
        u64::try_from(nanos).ok().map(|nanos| Self { nanos })
    }

    /// Nearest whole CUE frame.
    pub fn cue_frames(&self) -> u64 {
        let frames = (self.nanos as u128 * CUE_FRAMES_PER_SECOND as u128
            + NANOS_PER_SECOND as u128 / 2)
            / NANOS_PER_SECOND as u128;
        frames as u64
    }

    /// Parse `MM:SS:FF`. Minutes may exceed 99.
    pub fn from_cue(code: &str) -> Result<Self, TimeCodeError> {
        let err = || TimeCodeError::Cue(code.to_string());
        let mut parts = code.trim().split(':');
        let (Some(mm), Some(ss), Some(ff), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        let minutes = parse_digits(mm).ok_or_else(err)?;
        let seconds = parse_digits(ss).ok_or_else(err)?;
        let frames = parse_digits(ff).ok_or_else(err)?;
        if seconds >= 60 || frames >= CUE_FRAMES_PER_SECOND {
            return Err(err());
        }
        let total = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .and_then(|s| s.checked_mul(CUE_FRAMES_PER_SECOND))
            .and_then(|f| f.checked_add(frames))
            .ok_or_else(err)?;
        Self::from_cue_frames(total).ok_or_else(err)
    }

    /// Parse `HH:MM:SS[.fraction]`; fractions longer than nine digits are truncated.
    pub fn from_mka(code: &str) -> Result<Self, TimeCodeError> {
        let err = || TimeCodeError::Matroska(code.to_string());
        let mut parts = code.trim().split(':');
        let (Some(hh), Some(mm), Some(rest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        let (ss, fraction) = match rest.split_once('.') {
            Some((ss, fraction)) => (ss, fraction),
            None => (rest, ""),
        };
        let hours = parse_digits(hh).ok_or_else(err)?;
        let minutes = parse_digits(mm).ok_or_else(err)?;
        let seconds = parse_digits(ss).ok_or_else(err)?;
        if minutes >= 60 || seconds >= 60 {
            return Err(err());
        }
        let mut sub_nanos = 0;
        if !fraction.is_empty() {
            let digits: String = fraction.chars().take(9).collect();
            let value = parse_digits(&digits).ok_or_else(err)?;
            sub_nanos = value * 10u64.pow(9 - digits.len() as u32);
        }
        let nanos = hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes * 60 + seconds))
            .and_then(|s| s.checked_mul(NANOS_PER_SECOND))
            .and_then(|n| n.checked_add(sub_nanos))
            .ok_or_else(err)?;
        Ok(Self { nanos })
    }

    pub fn to_cue(&self) -> String {
        let frames = self.cue_frames();
        let per_minute = CUE_FRAMES_PER_SECOND * 60;
        format!(
            "{:02}:{:02}:{:02}",
            frames / per_minute,
            (frames / CUE_FRAMES_PER_SECOND) % 60,
            frames % CUE_FRAMES_PER_SECOND
        )
    }

    pub fn to_mka(&self) -> String {
        let secs = self.nanos / NANOS_PER_SECOND;
        format!(
            "{:02}:{:02}:{:02}.{:09}",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60,
            self.nanos % NANOS_PER_SECOND
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_mka())
    }
}

impl Add for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Timestamp) -> Timestamp {
        Timestamp {
            nanos: self.nanos + rhs.nanos,
        }
    }
}

impl AddAssign for Timestamp {
    fn add_assign(&mut self, rhs: Timestamp) {
        self.nanos += rhs.nanos;
    }
}

pub fn cue_time_to_mka_time(code: &str) -> Result<String, TimeCodeError> {
    Timestamp::from_cue(code).map(|t| t.to_mka())
}

pub fn mka_time_to_cue_time(code: &str) -> Result<String, TimeCodeError> {
    Timestamp::from_mka(code).map(|t| t.to_cue())
}

fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
