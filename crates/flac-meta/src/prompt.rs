//! Yes/no questions on the terminal.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

pub trait Prompt {
    /// Show `question` and return the raw answer line.
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Reads answers from standard input.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{question}").context("write prompt")?;
        stdout.flush().context("flush prompt")?;
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("read answer")?;
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// `[Y/n]` questions: only an answer starting with `n` declines.
pub fn accepts_by_default(answer: &str) -> bool {
    !answer.trim_start().to_lowercase().starts_with('n')
}

/// `[y/N]` questions: only an answer starting with `y` accepts.
pub fn accepts_explicitly(answer: &str) -> bool {
    answer.trim_start().to_lowercase().starts_with('y')
}
