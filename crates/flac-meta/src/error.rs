use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while building a [`crate::metadata::Metadata`].
///
/// All of these abort the run before any output is written.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("{path:?} doesn't contain tag {tag}")]
    TagNotFound { path: PathBuf, tag: String },

    #[error("incomplete metadata - missing {0}")]
    MissingField(&'static str),

    #[error("disc configuration error: {0}")]
    DiscConfiguration(String),

    #[error("CUE format error: {0}")]
    CueFormat(String),

    #[error("invalid medium {medium:?} - must be one of {choices}")]
    InvalidMedium { medium: String, choices: String },

    #[error("channels {0} not supported")]
    UnsupportedChannels(u32),

    #[error("can't parse date {0:?}")]
    InvalidDate(String),

    #[error("no tracks found in {0}")]
    NoTracks(String),

    #[error("{0}")]
    WrongMode(&'static str),
}

impl MetadataError {
    pub fn tag_not_found(path: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        Self::TagNotFound {
            path: path.into(),
            tag: tag.into(),
        }
    }
}
