//! One audio file with a CUE sheet.

use std::path::Path;

use anyhow::{Result, anyhow};
use flac_meta::cuewriter::rewrite_cue;
use flac_meta::metadata::Metadata;
use flac_meta::namegen::OutputName;

use super::Job;
use crate::discover;

pub fn run(job: &mut Job<'_>, source: &Path) -> Result<()> {
    let cue = discover::resolve_cue(source)?;
    let dir = cue.parent().map(Path::to_path_buf).unwrap_or_default();
    tracing::info!(cue = %cue.display(), "CUE mode");

    let meta = Metadata::from_cue(&cue, &job.args.overrides(), job.reader)?;
    let mut names = OutputName::new(meta.output_filename(Some(&dir)))?;
    let artwork = job.artwork(&names, &dir, None)?;
    if !job.confirm(&meta)? {
        return Ok(());
    }

    let copy = names.name("cue");
    let _copy = (copy != cue).then(|| job.cleanup.own(&copy));
    rewrite_cue(&cue, &copy)?;

    let audio = meta
        .audio_file()
        .ok_or_else(|| anyhow!("{:?} doesn't reference an audio file", cue))?;
    names.reserve("flac", audio);

    let _xml = job.write_xml(&meta, &names)?;
    job.mux(&meta, &names, &artwork, &dir)
}
