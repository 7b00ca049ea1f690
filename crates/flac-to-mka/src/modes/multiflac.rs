//! A directory of per-track FLAC files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flac_meta::cuewriter::write_cue;
use flac_meta::metadata::Metadata;
use flac_meta::namegen::OutputName;
use flac_meta::verifier::FlacVerifier;

use super::Job;
use crate::discover;
use crate::tools;

pub fn run(job: &mut Job<'_>, dir: &Path) -> Result<()> {
    let mut files = discover::flac_files(dir)?;
    if files.is_empty() {
        bail!("no FLAC files in {:?}", dir);
    }
    let meta = Metadata::from_files(&files, &job.args.overrides(), job.reader)?;
    let names = OutputName::new(meta.output_filename(Some(dir)))?;

    // A previous merge is never a source track.
    let merged = names.name("flac");
    if merged.exists() {
        files.retain(|f| f != &merged);
        if !job.args.skipmerge {
            tracing::info!(path = %merged.display(), "deleting previously merged FLAC");
            std::fs::remove_file(&merged).with_context(|| format!("delete {:?}", merged))?;
        }
    } else if job.args.skipmerge {
        bail!(
            "requested skip merge mode but file {:?} doesn't exist",
            merged
        );
    }

    let verifier = FlacVerifier::verify(&files, job.reader)?;
    tracing::info!(format = %verifier, tracks = meta.tracks.len(), "multi-FLAC mode");

    if job.args.cue || job.args.cueflac {
        cue_or_flac(job, &files, &meta, &names)
    } else {
        matroska(job, dir, &files, &meta, &names, &verifier)
    }
}

/// Keep a CUE sheet, and with `--cueflac` the merged FLAC it describes.
fn cue_or_flac(
    job: &mut Job<'_>,
    files: &[PathBuf],
    meta: &Metadata,
    names: &OutputName,
) -> Result<()> {
    if !job.confirm(meta)? {
        return Ok(());
    }
    let cue = job.cleanup.own(names.name("cue"));
    write_cue(meta, cue.path())?;
    let cue = cue.keep();
    tracing::info!(path = %cue.display(), "kept CUE sheet");

    if job.args.cueflac {
        let flac = job.cleanup.own(names.name("flac"));
        tools::merge_flacs(job.tools, files, &flac)?;
        flac.keep();
    }
    Ok(())
}

fn matroska(
    job: &mut Job<'_>,
    dir: &Path,
    files: &[PathBuf],
    meta: &Metadata,
    names: &OutputName,
    verifier: &FlacVerifier,
) -> Result<()> {
    let merged = names.name("flac");
    let artwork = job.artwork(names, dir, Some(&merged))?;
    if !job.confirm(meta)? {
        return Ok(());
    }

    let _cue = if !meta.is_multidisc() && verifier.is_cd() {
        let cue = job.cleanup.own(names.name("cue"));
        write_cue(meta, cue.path())?;
        Some(cue)
    } else {
        None
    };
    let _xml = job.write_xml(meta, names)?;

    let _flac = if job.args.skipmerge {
        None
    } else {
        let flac = job.cleanup.own(&merged);
        tools::merge_flacs(job.tools, files, &flac)?;
        Some(flac)
    };
    job.mux(meta, names, &artwork, dir)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use flac_meta::source::AudioTags;

    use super::*;
    use crate::cleanup::CleanupRegistry;
    use crate::cli::Args;
    use crate::config::Tools;
    use crate::testing::{FakeReader, ScriptedPrompt, TempDir, cd_stream, png};

    const STEM: &str = "Nina Simone - 1965 - Pastel Blues";

    fn track_tags(n: u32, title: &str) -> AudioTags {
        AudioTags::new(cd_stream(180))
            .with_tag("ALBUM", "Pastel Blues")
            .with_tag("ARTIST", "Nina Simone")
            .with_tag("GENRE", "Jazz")
            .with_tag("DATE", "1965-03-01")
            .with_tag("TITLE", title)
            .with_tag("TRACKNUMBER", n.to_string())
    }

    fn fixture(dir: &Path) -> FakeReader {
        let mut reader = FakeReader::default();
        for (n, title) in [(1, "Be My Husband"), (2, "Nobody Knows")] {
            let path = dir.join(format!("{n:02}.flac"));
            std::fs::write(&path, b"").unwrap();
            reader.add(&path, track_tags(n, title));
        }
        std::fs::write(dir.join("cover.png"), png(700, 700)).unwrap();
        reader
    }

    fn execute(argv: &[&str], reader: &FakeReader, cleanup: &CleanupRegistry) -> Result<()> {
        let mut full = vec!["flac-to-mka"];
        full.extend_from_slice(argv);
        let args = Args::try_parse_from(full).unwrap();
        let tools = Tools {
            sox: PathBuf::from("true"),
            mkvmerge: PathBuf::from("true"),
            output_dir: None,
        };
        let mut prompt = ScriptedPrompt::default();
        let mut out = Vec::new();
        let mut job = Job {
            args: &args,
            tools: &tools,
            cleanup,
            reader,
            prompt: &mut prompt,
            out: &mut out,
        };
        run(&mut job, &args.source)
    }

    #[test]
    fn cue_mode_keeps_the_sheet() {
        let dir = TempDir::new("multi-cue");
        let reader = fixture(dir.path());
        let source = dir.path().to_string_lossy().into_owned();
        let cleanup = CleanupRegistry::new();
        execute(&[source.as_str(), "--cue", "--no-confirm"], &reader, &cleanup).unwrap();

        let cue = dir.path().join(format!("{STEM}.cue"));
        let text = std::fs::read_to_string(&cue).unwrap();
        assert!(text.contains(&format!("FILE \"{STEM}.wav\" WAVE")));
        assert!(text.contains("INDEX 01 03:00:00"));
        assert!(cleanup.pending().is_empty());
    }

    #[test]
    fn stale_merge_is_removed_from_sources() {
        let dir = TempDir::new("multi-stale");
        let mut reader = fixture(dir.path());
        let merged = dir.path().join(format!("{STEM}.flac"));
        std::fs::write(&merged, b"old merge").unwrap();
        reader.add(&merged, track_tags(3, "Pastel Blues"));
        let source = dir.path().to_string_lossy().into_owned();
        let cleanup = CleanupRegistry::new();
        execute(&[source.as_str(), "--cue", "--no-confirm"], &reader, &cleanup).unwrap();
        assert!(!merged.exists());

        let text = std::fs::read_to_string(dir.path().join(format!("{STEM}.cue"))).unwrap();
        assert!(text.contains("TRACK 02 AUDIO"));
        assert!(!text.contains("TRACK 03"));
    }

    #[test]
    fn skipmerge_needs_an_existing_merge() {
        let dir = TempDir::new("multi-skip");
        let reader = fixture(dir.path());
        let source = dir.path().to_string_lossy().into_owned();
        let cleanup = CleanupRegistry::new();
        let err = execute(&[source.as_str(), "--skipmerge", "--no-confirm"], &reader, &cleanup)
            .unwrap_err();
        assert!(err.to_string().contains("skip merge"));
    }

    #[cfg(unix)]
    #[test]
    fn matroska_mode_cleans_every_sidecar() {
        let dir = TempDir::new("multi-mka");
        let reader = fixture(dir.path());
        let source = dir.path().to_string_lossy().into_owned();
        let cleanup = CleanupRegistry::new();
        execute(&[source.as_str(), "--no-confirm"], &reader, &cleanup).unwrap();

        let stem = dir.path().join(STEM);
        for ext in ["cue", "xml", "chapters.xml", "png", "flac"] {
            let path = PathBuf::from(format!("{}.{ext}", stem.display()));
            assert!(!path.exists(), "{ext} left behind");
        }
        assert!(dir.path().join("cover.png").exists());
        assert!(cleanup.pending().is_empty());
    }
}
