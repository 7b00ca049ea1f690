pub mod chapter_id;
pub mod chapterwriter;
pub mod cuewriter;
pub mod error;
pub mod metadata;
pub mod namegen;
pub mod prompt;
pub mod source;
pub mod tags;
pub mod tagwriter;
pub mod time;
pub mod verifier;
pub mod xml;

#[cfg(test)]
pub(crate) mod testing;
