//! Conversion drivers.

pub mod cue;
pub mod multiflac;

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use flac_meta::chapter_id::ChapterIdPool;
use flac_meta::chapterwriter::write_chapters;
use flac_meta::metadata::Metadata;
use flac_meta::namegen::OutputName;
use flac_meta::prompt::Prompt;
use flac_meta::source::TagReader;
use flac_meta::tags::TagKey;
use flac_meta::tagwriter::write_tags;

use crate::artwork::{Artwork, ArtworkOptions};
use crate::cleanup::{CleanupRegistry, OutputFile};
use crate::cli::Args;
use crate::config::Tools;
use crate::discover::{self, Mode};
use crate::tools::{self, MkaJob};

/// One invocation's inputs and collaborators.
pub struct Job<'a> {
    pub args: &'a Args,
    pub tools: &'a Tools,
    pub cleanup: &'a CleanupRegistry,
    pub reader: &'a dyn TagReader,
    pub prompt: &'a mut dyn Prompt,
    pub out: &'a mut dyn Write,
}

impl Job<'_> {
    /// Print the metadata and ask to continue, unless `--no-confirm`.
    fn confirm(&mut self, meta: &Metadata) -> Result<bool> {
        if self.args.no_confirm {
            return Ok(true);
        }
        let confirmed = meta.confirm(&mut *self.out, &mut *self.prompt)?;
        if !confirmed {
            tracing::info!("cancelled");
        }
        Ok(confirmed)
    }

    fn artwork(
        &self,
        names: &OutputName,
        source_dir: &Path,
        exclude: Option<&Path>,
    ) -> Result<Artwork> {
        let options = ArtworkOptions {
            image: self.args.image.as_deref(),
            force: self.args.forceimage,
            source_dir,
            target: names.name("jpg"),
            exclude,
        };
        Artwork::resolve(&options, self.reader, self.cleanup)
    }

    /// Tag and chapter documents sharing one chapter-ID pool.
    fn write_xml(&self, meta: &Metadata, names: &OutputName) -> Result<[OutputFile; 2]> {
        let mut pool = ChapterIdPool::new();
        let tags = self.cleanup.own(names.name("xml"));
        write_tags(meta, &mut pool, tags.path())?;
        let chapters = self.cleanup.own(names.name("chapters.xml"));
        write_chapters(meta, &mut pool, chapters.path())?;
        Ok([tags, chapters])
    }

    fn mux(
        &self,
        meta: &Metadata,
        names: &OutputName,
        artwork: &Artwork,
        source_dir: &Path,
    ) -> Result<()> {
        let default_dir = self.tools.output_dir.as_deref().unwrap_or(source_dir);
        let job = MkaJob {
            names,
            title: meta.get(TagKey::Title),
            artwork,
            output: tools::mka_path(self.args.output.as_deref(), names, default_dir),
        };
        tools::create_mka(self.tools, &job)
    }
}

pub fn run(job: &mut Job<'_>) -> Result<()> {
    match discover::select_mode(&job.args.source)? {
        Mode::Cue(source) => cue::run(job, &source),
        Mode::MultiFlac(dir) => multiflac::run(job, &dir),
    }
}
