//! Test doubles shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};

use crate::prompt::Prompt;
use crate::source::{AudioTags, EmbeddedPicture, StreamInfo, TagReader};

pub fn stream(sample_rate: u32, bits_per_sample: u32, channels: u32) -> StreamInfo {
    StreamInfo {
        sample_rate,
        bits_per_sample,
        channels,
        total_frames: sample_rate as u64 * 60,
    }
}

/// CD-format stream lasting `seconds`.
pub fn cd_stream(seconds: u64) -> StreamInfo {
    StreamInfo {
        sample_rate: 44_100,
        bits_per_sample: 16,
        channels: 2,
        total_frames: 44_100 * seconds,
    }
}

/// In-memory [`TagReader`] keyed by path.
#[derive(Default)]
pub struct FakeReader {
    files: HashMap<PathBuf, AudioTags>,
}

impl FakeReader {
    pub fn add(&mut self, path: &Path, tags: AudioTags) {
        self.files.insert(path.to_path_buf(), tags);
    }
}

impl TagReader for FakeReader {
    fn read(&self, path: &Path) -> Result<AudioTags> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such file {:?}", path))
    }

    fn front_cover(&self, path: &Path) -> Result<Option<EmbeddedPicture>> {
        self.read(path).map(|_| None)
    }
}

/// Prompt answering from a fixed script.
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<'a>(answers: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            answers: answers.into_iter().map(str::to_string).collect(),
            questions: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected prompt {question:?}"))
    }
}

/// Unique scratch directory removed on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("flac-meta-{prefix}-{nanos}"));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
