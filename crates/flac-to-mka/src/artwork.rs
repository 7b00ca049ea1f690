//! Cover art for the MKA attachment.
//!
//! Resolution order: an explicit `--image`, an existing `<stem>.jpg`, the
//! largest usable image in the source directory, and finally the front cover
//! embedded in the first source FLAC. Copied or extracted images are owned
//! and deleted when the run ends.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flac_meta::source::TagReader;
use lofty::PictureInformation;
use thiserror::Error;

use crate::cleanup::{CleanupRegistry, OutputFile};
use crate::discover;

const MIN_SIDE: u32 = 500;
const MAX_ASPECT_SKEW: f64 = 0.01;
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("invalid artwork: {0}")]
    InvalidFormat(String),
    #[error("{0}")]
    NotFound(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    fn dimensions(self, data: &[u8]) -> Option<(u32, u32)> {
        let info = match self {
            ImageFormat::Jpeg => PictureInformation::from_jpeg(data),
            ImageFormat::Png => PictureInformation::from_png(data),
        };
        info.ok().map(|info| (info.width, info.height))
    }
}

/// Where to look for artwork.
#[derive(Clone, Debug)]
pub struct ArtworkOptions<'a> {
    /// Image given on the command line.
    pub image: Option<&'a Path>,
    /// Accept an explicit image regardless of its dimensions.
    pub force: bool,
    pub source_dir: &'a Path,
    /// `<stem>.jpg`; a found `.png` is copied next to it as `<stem>.png`.
    pub target: PathBuf,
    /// A merged FLAC in the source directory which carries no cover.
    pub exclude: Option<&'a Path>,
}

#[derive(Debug)]
pub struct Artwork {
    image: PathBuf,
    _owned: Option<OutputFile>,
}

impl Artwork {
    pub fn resolve(
        options: &ArtworkOptions<'_>,
        reader: &dyn TagReader,
        cleanup: &CleanupRegistry,
    ) -> Result<Self> {
        if let Some(image) = options.image {
            return Self::explicit(image, options);
        }
        if options.target.is_file() {
            tracing::info!(image = %options.target.display(), "using existing image");
            return Ok(Self {
                image: options.target.clone(),
                _owned: None,
            });
        }
        if let Some(artwork) = Self::copy_largest(options, cleanup)? {
            return Ok(artwork);
        }
        Self::extract_embedded(options, reader, cleanup)
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    /// Lower-case image extension, `jpg` or `png`.
    pub fn image_type(&self) -> String {
        self.image
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    fn explicit(image: &Path, options: &ArtworkOptions<'_>) -> Result<Self> {
        let image = if image.is_file() {
            image.to_path_buf()
        } else if options.source_dir.join(image).is_file() {
            options.source_dir.join(image)
        } else {
            return Err(
                ArtworkError::NotFound(format!("specified image {:?} not found", image)).into(),
            );
        };
        if !options.force && usable_width(&image)?.is_none() {
            return Err(ArtworkError::InvalidFormat(
                "specified image either too small or incorrect aspect ratio".to_string(),
            )
            .into());
        }
        Ok(Self {
            image,
            _owned: None,
        })
    }

    fn copy_largest(
        options: &ArtworkOptions<'_>,
        cleanup: &CleanupRegistry,
    ) -> Result<Option<Self>> {
        let mut best: Option<(u32, PathBuf)> = None;
        for candidate in discover::files_with_extensions(options.source_dir, &IMAGE_EXTENSIONS)? {
            tracing::debug!(path = %candidate.display(), "found image");
            let Some(width) = usable_width(&candidate)? else {
                continue;
            };
            if best.as_ref().is_none_or(|(w, _)| width > *w) {
                best = Some((width, candidate));
            }
        }
        let Some((_, source)) = best else {
            return Ok(None);
        };

        let is_png = source
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        let target = if is_png {
            options.target.with_extension("png")
        } else {
            options.target.clone()
        };
        let owned = cleanup.own(&target);
        std::fs::copy(&source, &target)
            .with_context(|| format!("copy {:?} to {:?}", source, target))?;
        tracing::info!(source = %source.display(), "using image source");
        Ok(Some(Self {
            image: target,
            _owned: Some(owned),
        }))
    }

    fn extract_embedded(
        options: &ArtworkOptions<'_>,
        reader: &dyn TagReader,
        cleanup: &CleanupRegistry,
    ) -> Result<Self> {
        let not_found =
            || ArtworkError::NotFound("could not find artwork image; specify with --image".into());
        let flac = discover::flac_files(options.source_dir)?
            .into_iter()
            .find(|f| Some(f.as_path()) != options.exclude)
            .ok_or_else(not_found)?;
        let picture = reader.front_cover(&flac)?.ok_or_else(not_found)?;
        let format = ImageFormat::sniff(&picture.data).ok_or_else(|| {
            ArtworkError::InvalidFormat(format!(
                "expected JPG/PNG artwork, found {}",
                picture.mime_type
            ))
        })?;

        let target = options.target.with_extension(format.extension());
        let owned = cleanup.own(&target);
        std::fs::write(&target, &picture.data).with_context(|| format!("write {:?}", target))?;
        if !format.dimensions(&picture.data).is_some_and(is_usable) {
            return Err(ArtworkError::InvalidFormat(
                "embedded artwork is either too small or has wrong aspect ratio".to_string(),
            )
            .into());
        }
        tracing::info!(flac = %flac.display(), format = format.extension(), "using embedded artwork");
        Ok(Self {
            image: target,
            _owned: Some(owned),
        })
    }
}

fn is_usable((width, height): (u32, u32)) -> bool {
    if width.min(height) < MIN_SIDE {
        tracing::debug!(width, height, "image too small");
        return false;
    }
    let aspect = f64::from(width) / f64::from(height);
    if (aspect - 1.0).abs() > MAX_ASPECT_SKEW {
        tracing::debug!(aspect, "image not square");
        return false;
    }
    true
}

/// Width of `path` if it is a usable cover, `None` otherwise.
fn usable_width(path: &Path) -> Result<Option<u32>> {
    let data = std::fs::read(path).with_context(|| format!("read {:?}", path))?;
    let dimensions = ImageFormat::sniff(&data).and_then(|format| format.dimensions(&data));
    Ok(dimensions.filter(|&d| is_usable(d)).map(|(width, _)| width))
}
