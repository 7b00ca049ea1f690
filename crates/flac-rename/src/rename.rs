//! `<ARTIST> - <disc.><NN> - <TITLE>.flac` file names.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flac_meta::metadata::{Metadata, Overrides};
use flac_meta::namegen::sanitize_filename;
use flac_meta::source::{AudioTags, TagReader};
use flac_meta::tags::TagKey;

const UNICODE_PLACEHOLDER: &str = "-- Unicode problems --";

/// Where renamed files go and whose artist they carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Same directory, album-level artist for every file.
    Flat { artist: String },
    /// Per-file artist, moved into a directory named after the file's album.
    ByAlbum,
}

impl Layout {
    pub fn flat(files: &[PathBuf], reader: &dyn TagReader) -> Result<Self> {
        let meta = Metadata::from_files(files, &Overrides::default(), reader)?;
        Ok(Layout::Flat {
            artist: meta.get(TagKey::Artist).to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl Rename {
    fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// `"2."` for disc 2 of 3, `"02."` for disc 2 of 12, empty without disc tags.
pub fn disc_prefix(tags: &AudioTags) -> Result<String> {
    let (Some(total), Some(number)) = (tags.get("DISCTOTAL"), tags.get("DISCNUMBER")) else {
        return Ok(String::new());
    };
    let total: u32 = total
        .trim()
        .parse()
        .with_context(|| format!("DISCTOTAL {total:?} is not a number"))?;
    if total < 2 {
        bail!("DISCTOTAL {total} needs multiple discs");
    }
    let number: u32 = number
        .trim()
        .parse()
        .with_context(|| format!("DISCNUMBER {number:?} is not a number"))?;
    let width = total.to_string().len();
    Ok(format!("{number:0width$}."))
}

/// New file name, or `None` when a tag it needs is missing.
fn file_name(path: &Path, tags: &AudioTags, artist: Option<&str>) -> Result<Option<String>> {
    let artist = match artist.or_else(|| tags.get("ARTIST")) {
        Some(artist) => artist,
        None => return Ok(missing(path, "ARTIST")),
    };
    let Some(track) = tags.get("TRACKNUMBER") else {
        return Ok(missing(path, "TRACKNUMBER"));
    };
    let Some(title) = tags.get("TITLE") else {
        return Ok(missing(path, "TITLE"));
    };
    let name = format!(
        "{artist} - {}{:0>2} - {title}.flac",
        disc_prefix(tags)?,
        track.trim()
    );
    Ok(Some(sanitize_filename(&name)))
}

fn missing(path: &Path, tag: &str) -> Option<String> {
    tracing::warn!(path = %path.display(), tag, "no value, keeping name");
    None
}

/// Work out the new location of every file.
pub fn plan(files: &[PathBuf], reader: &dyn TagReader, layout: &Layout) -> Result<Vec<Rename>> {
    let mut renames = Vec::with_capacity(files.len());
    for path in files {
        let tags = reader.read(path)?;
        let dir = path.parent().unwrap_or(Path::new(""));
        let to = match layout {
            Layout::Flat { artist } => {
                file_name(path, &tags, Some(artist.as_str()))?.map(|name| dir.join(name))
            }
            Layout::ByAlbum => match tags.get("ALBUM") {
                Some(album) => file_name(path, &tags, None)?
                    .map(|name| dir.join(sanitize_filename(album)).join(name)),
                None => missing(path, "ALBUM").map(PathBuf::from),
            },
        };
        renames.push(Rename {
            from: path.clone(),
            to: to.unwrap_or_else(|| path.clone()),
        });
    }
    Ok(renames)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Bordered `old => new` table with `title` on top.
pub fn table(title: &str, renames: &[Rename]) -> Vec<String> {
    let names: Vec<(String, String)> = renames
        .iter()
        .map(|r| (display_name(&r.from), display_name(&r.to)))
        .collect();
    let old = names.iter().map(|(o, _)| o.chars().count()).max().unwrap_or(0);
    let new = names.iter().map(|(_, n)| n.chars().count()).max().unwrap_or(0);
    let inner = old + new + 6;

    let mut lines = vec![
        format!("/{}\\", "-".repeat(inner)),
        format!("|{title:^inner$}|"),
        format!("|{}|", "-".repeat(inner)),
    ];
    for (from, to) in &names {
        lines.push(format!("| {from:<old$} => {to:<new$} |"));
    }
    lines.push(format!("\\{}/", "-".repeat(inner)));
    lines
}

pub fn print_table(out: &mut dyn Write, lines: &[String]) -> Result<()> {
    for line in lines {
        if writeln!(out, "{line}").is_err() {
            writeln!(out, "{UNICODE_PLACEHOLDER}").context("write rename table")?;
        }
    }
    out.flush().context("flush rename table")
}

/// Perform the renames, creating album directories as needed.
pub fn apply(renames: &[Rename]) -> Result<usize> {
    let mut renamed = 0;
    for rename in renames.iter().filter(|r| !r.is_noop()) {
        if let Some(parent) = rename.to.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create dir {:?}", parent))?;
        }
        std::fs::rename(&rename.from, &rename.to)
            .with_context(|| format!("rename {:?} to {:?}", rename.from, rename.to))?;
        tracing::info!(from = %rename.from.display(), to = %rename.to.display(), "renamed");
        renamed += 1;
    }
    Ok(renamed)
}
