//! CUE sheets for the merged audio file.
//!
//! [`build_cue`] renders a sheet from metadata; [`rewrite_cue`] copies an
//! existing sheet so it points at the merged file and keeps only the
//! remarks this toolkit understands.

use std::path::Path;

use anyhow::{Context, Result};

use crate::metadata::Metadata;
use crate::tags::TagKey;

/// Tags carried as `REM` lines.
pub const REMARK_TAGS: [TagKey; 5] = [
    TagKey::Genre,
    TagKey::Version,
    TagKey::DiscName,
    TagKey::Label,
    TagKey::IssueDate,
];

pub fn build_cue(meta: &Metadata) -> String {
    let artist = meta.get(TagKey::Artist);
    let mut lines = vec![
        format!("PERFORMER \"{artist}\""),
        format!("TITLE \"{}\"", meta.get(TagKey::Title)),
        format!("REM DATE \"{}\"", meta.get(TagKey::DateRecorded)),
    ];
    for key in REMARK_TAGS {
        if meta.contains(key) {
            lines.push(format!("REM {} \"{}\"", key, meta.get(key)));
        }
    }
    let merged = meta.output_filename(None);
    let merged = merged
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    lines.push(format!("FILE \"{merged}\" WAVE"));

    for (index, track) in meta.tracks.iter().enumerate() {
        lines.push(format!("  TRACK {:02} AUDIO", index + 1));
        lines.push(format!("    TITLE \"{}\"", track.display_title()));
        lines.push(format!("    PERFORMER \"{artist}\""));
        lines.push(format!("    INDEX 01 {}", track.start_time.to_cue()));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

pub fn write_cue(meta: &Metadata, path: &Path) -> Result<()> {
    std::fs::write(path, build_cue(meta)).with_context(|| format!("write {:?}", path))?;
    tracing::info!(path = %path.display(), "wrote CUE sheet");
    Ok(())
}

fn keep_line(line: &str) -> bool {
    let line = line.trim_start();
    let Some(remark) = line.strip_prefix("REM") else {
        return true;
    };
    let remark = remark.trim_start();
    remark.starts_with("DATE")
        || REMARK_TAGS
            .iter()
            .any(|tag| remark.starts_with(tag.as_str()))
}

/// Rewrite the text of a CUE sheet so its `FILE` line names `audio_name`.
pub fn rewrite_cue_text(text: &str, audio_name: &str) -> String {
    let mut out = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() || !keep_line(line) {
            continue;
        }
        if line.starts_with("FILE ") {
            out.push(format!("FILE \"{audio_name}\" WAVE"));
        } else if line.contains('"') {
            let mut parts = line.split('"');
            let prefix = parts.next().unwrap_or("").trim_end();
            let value = parts.next().unwrap_or("").trim_end();
            if value.trim().is_empty() {
                continue;
            }
            out.push(format!("{prefix} \"{value}\""));
        } else {
            out.push(line.to_string());
        }
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Copy `source` to `output`, pointing it at `output`'s `.wav` twin.
///
/// Returns `false` without touching anything when both paths are the same.
pub fn rewrite_cue(source: &Path, output: &Path) -> Result<bool> {
    if source == output {
        return Ok(false);
    }
    tracing::info!(from = %source.display(), to = %output.display(), "rewriting CUE sheet");
    let text = std::fs::read_to_string(source).with_context(|| format!("read {:?}", source))?;
    let audio_name = output
        .with_extension("wav")
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    std::fs::write(output, rewrite_cue_text(&text, &audio_name))
        .with_context(|| format!("write {:?}", output))?;
    Ok(true)
}
