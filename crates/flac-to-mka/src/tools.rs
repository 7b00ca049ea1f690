//! SoX merging and mkvmerge muxing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use flac_meta::namegen::OutputName;
use thiserror::Error;

use crate::artwork::Artwork;
use crate::cleanup::OutputFile;
use crate::config::Tools;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} failed with {status}")]
    Failed { tool: String, status: ExitStatus },
    #[error("expected 'jpg' or 'png' artwork, found '{0}'")]
    UnsupportedImage(String),
}

fn run(program: &Path, args: &[OsString]) -> Result<()> {
    tracing::info!(tool = %program.display(), args = args.len(), "running");
    tracing::debug!(?args, "command line");
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("spawn {:?}", program))?;
    if !status.success() {
        return Err(ToolError::Failed {
            tool: program.display().to_string(),
            status,
        }
        .into());
    }
    Ok(())
}

/// Concatenate `files` into `output`. A partial output is removed on failure.
pub fn merge_flacs(tools: &Tools, files: &[PathBuf], output: &OutputFile) -> Result<()> {
    output.discard();
    let mut args: Vec<OsString> = files.iter().map(|f| f.clone().into_os_string()).collect();
    args.push(output.path().as_os_str().to_owned());
    if let Err(e) = run(&tools.sox, &args) {
        output.discard();
        return Err(e);
    }
    tracing::info!(path = %output.path().display(), files = files.len(), "merged FLAC files");
    Ok(())
}

/// Where the finished MKA goes.
///
/// An `output` with an extension is used as-is, any other `output` is a
/// directory, and without one the configured or source directory is used.
pub fn mka_path(output: Option<&Path>, names: &OutputName, default_dir: &Path) -> PathBuf {
    let file_name = format!("{} [FLAC].mka", names.base_name());
    match output {
        Some(path) if path.extension().is_some() => path.to_path_buf(),
        Some(dir) => dir.join(file_name),
        None => default_dir.join(file_name),
    }
}

fn attach(args: &mut Vec<OsString>, mime: &str, embed_name: String, file: &Path) {
    args.push("--attachment-mime-type".into());
    args.push(mime.into());
    args.push("--attachment-name".into());
    args.push(embed_name.into());
    args.push("--attach-file".into());
    args.push(file.as_os_str().to_owned());
}

/// Everything mkvmerge needs to build one MKA.
pub struct MkaJob<'a> {
    pub names: &'a OutputName,
    pub title: &'a str,
    pub artwork: &'a Artwork,
    pub output: PathBuf,
}

impl MkaJob<'_> {
    pub fn args(&self) -> Result<Vec<OsString>> {
        let names = self.names;
        let mut args: Vec<OsString> = vec![
            "-o".into(),
            self.output.clone().into_os_string(),
            "--title".into(),
            self.title.into(),
        ];
        for arg in [
            "--default-track",
            "0:yes",
            "--forced-track",
            "0:no",
            "-a",
            "0",
            "-D",
            "-S",
            "-T",
            "--no-global-tags",
            "--no-chapters",
            "(",
        ] {
            args.push(arg.into());
        }
        args.push(names.name("flac").into_os_string());
        for arg in [")", "--track-order", "0:0"] {
            args.push(arg.into());
        }

        let cue = names.name("cue");
        if cue.exists() {
            attach(&mut args, "text/plain", names.embed_name("cue"), &cue);
        }

        let image_type = self.artwork.image_type();
        let mime = match image_type.as_str() {
            "jpg" => "image/jpeg",
            "png" => "image/png",
            _ => return Err(ToolError::UnsupportedImage(image_type).into()),
        };
        attach(&mut args, mime, names.embed_name(&image_type), self.artwork.image());

        args.push("--chapters".into());
        args.push(names.name("chapters.xml").into_os_string());
        args.push("--global-tags".into());
        args.push(names.name("xml").into_os_string());
        Ok(args)
    }
}

pub fn create_mka(tools: &Tools, job: &MkaJob<'_>) -> Result<()> {
    run(&tools.mkvmerge, &job.args()?)?;
    tracing::info!(path = %job.output.display(), "created MKA");
    Ok(())
}
