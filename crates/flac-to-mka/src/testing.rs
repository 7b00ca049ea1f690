use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use flac_meta::prompt::Prompt;
use flac_meta::source::{AudioTags, EmbeddedPicture, StreamInfo, TagReader};

/// Unique scratch directory, removed on drop.
pub struct TempDir(PathBuf);

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("flac-to-mka-{prefix}-{nanos}"));
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

pub fn cd_stream(seconds: u64) -> StreamInfo {
    StreamInfo {
        sample_rate: 44_100,
        bits_per_sample: 16,
        channels: 2,
        total_frames: 44_100 * seconds,
    }
}

/// In-memory tags and covers keyed by path.
#[derive(Default)]
pub struct FakeReader {
    files: HashMap<PathBuf, AudioTags>,
    covers: HashMap<PathBuf, EmbeddedPicture>,
}

impl FakeReader {
    pub fn add(&mut self, path: &Path, tags: AudioTags) {
        self.files.insert(path.to_path_buf(), tags);
    }

    pub fn add_cover(&mut self, path: &Path, mime_type: &str, data: Vec<u8>) {
        self.covers.insert(
            path.to_path_buf(),
            EmbeddedPicture {
                mime_type: mime_type.to_string(),
                data,
            },
        );
    }
}

impl TagReader for FakeReader {
    fn read(&self, path: &Path) -> Result<AudioTags> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no fake tags for {:?}", path))
    }

    fn front_cover(&self, path: &Path) -> Result<Option<EmbeddedPicture>> {
        Ok(self.covers.get(path).cloned())
    }
}

/// PNG signature and `IHDR` chunk for a `width`x`height` RGB image.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 2, 0, 0, 0]);
    data.extend_from_slice(&[0; 4]);
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(b"IEND");
    data.extend_from_slice(&[0; 4]);
    data
}

/// Answers questions from a fixed script and records them.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Vec<String>,
    pub questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<'a>(answers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut answers: Vec<String> = answers.into_iter().map(str::to_string).collect();
        answers.reverse();
        Self {
            answers,
            questions: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.questions.push(question.to_string());
        self.answers
            .pop()
            .ok_or_else(|| anyhow!("unexpected question {question:?}"))
    }
}
