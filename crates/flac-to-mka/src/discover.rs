//! Source file discovery and mode selection.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// How a source argument is converted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// One audio file described by a CUE sheet; holds the sheet or its directory.
    Cue(PathBuf),
    /// A directory of per-track FLAC files.
    MultiFlac(PathBuf),
}

/// Sorted files in `dir` whose extension matches one of `extensions`, ignoring case.
pub fn files_with_extensions(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read dir {:?}", dir))? {
        let entry = entry.with_context(|| format!("read dir entry in {:?}", dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path.extension().and_then(|e| e.to_str()).is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| ext.eq_ignore_ascii_case(wanted))
        });
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn flac_files(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_extensions(dir, &["flac"])
}

pub fn cue_files(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_extensions(dir, &["cue"])
}

fn is_cue(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("cue"))
}

/// Pick the conversion mode for `source`.
pub fn select_mode(source: &Path) -> Result<Mode> {
    if is_cue(source) {
        return Ok(Mode::Cue(source.to_path_buf()));
    }
    let flacs = flac_files(source)?;
    if flacs.is_empty() {
        bail!("no FLAC file(s) in {:?}", source);
    }
    let cues = cue_files(source)?;
    let mode = if flacs.len() == 1 && cues.len() == 1 {
        Mode::Cue(source.to_path_buf())
    } else {
        Mode::MultiFlac(source.to_path_buf())
    };
    tracing::debug!(?mode, flacs = flacs.len(), cues = cues.len(), "selected mode");
    Ok(mode)
}

/// The CUE sheet named by `source`, or the only one in that directory.
pub fn resolve_cue(source: &Path) -> Result<PathBuf> {
    if source.is_file() {
        return Ok(source.to_path_buf());
    }
    let mut cues = cue_files(source)?;
    match cues.len() {
        0 => bail!("no CUE file found in {:?}", source),
        1 => Ok(cues.remove(0)),
        n => bail!("{n} CUE files found in {:?}", source),
    }
}
