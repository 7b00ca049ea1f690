//! Output file names derived from one base name.
//!
//! Every generated file (merged FLAC, CUE copy, tag and chapter XML, cover
//! art) is `<stem>.<ext>`, unless an extension has been reserved for a file
//! with a different name.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NameError {
    #[error("can't derive output names from {0:?}, it has no extension")]
    NoExtension(PathBuf),
}

#[derive(Clone, Debug)]
pub struct OutputName {
    stem: PathBuf,
    reserved: HashMap<String, PathBuf>,
}

impl OutputName {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, NameError> {
        let path = path.as_ref();
        if path.extension().is_none() {
            return Err(NameError::NoExtension(path.to_path_buf()));
        }
        let stem = match path.file_stem() {
            Some(stem) => path.with_file_name(stem),
            None => return Err(NameError::NoExtension(path.to_path_buf())),
        };
        Ok(Self {
            stem,
            reserved: HashMap::new(),
        })
    }

    /// Path without extension.
    pub fn stem(&self) -> &Path {
        &self.stem
    }

    pub fn directory(&self) -> &Path {
        self.stem.parent().unwrap_or(Path::new(""))
    }

    /// File name without directory or extension.
    pub fn base_name(&self) -> String {
        self.stem
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `<stem>.<ext>`, or the file reserved for `ext`.
    pub fn name(&self, ext: &str) -> PathBuf {
        if let Some(reserved) = self.reserved.get(ext) {
            return self.directory().join(reserved);
        }
        let mut name = OsString::from(self.stem.as_os_str());
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }

    /// Route `ext` to `filename`, relative to the stem's directory.
    pub fn reserve(&mut self, ext: &str, filename: impl Into<PathBuf>) {
        self.reserved.insert(ext.to_string(), filename.into());
    }

    /// Attachment name stored inside the container, `<base name>.<ext>`.
    pub fn embed_name(&self, ext: &str) -> String {
        format!("{}.{}", self.base_name(), ext)
    }
}

/// Make `name` safe as a file name on common filesystems.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '|' | '?' | '*'))
        .map(|c| match c {
            '<' | '>' | ':' | '/' | '\\' => '-',
            '"' => '\'',
            other => other,
        })
        .collect()
}
