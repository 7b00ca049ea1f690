//! Random Matroska UIDs shared by the tag and chapter documents.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LOWEST: u64 = 1_000_000_000_000_000;
const HIGHEST: u64 = 10_000_000_000_000_000;

/// Append-only pool of unique 16-digit identifiers.
///
/// A request for `n` chapters sees the first `n + 1` identifiers; the extra
/// one, at index `-1`, names the edition. Asking for more later only
/// appends, so earlier results stay a prefix of later ones.
#[derive(Debug)]
pub struct ChapterIdPool {
    rng: StdRng,
    ids: Vec<u64>,
    seen: HashSet<u64>,
}

impl ChapterIdPool {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            ids: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers for `n` chapters plus the whole-work entry.
    pub fn ids(&mut self, n: usize) -> ChapterIds<'_> {
        while self.ids.len() < n + 1 {
            let id = self.rng.gen_range(LOWEST..HIGHEST);
            if self.seen.insert(id) {
                self.ids.push(id);
            }
        }
        ChapterIds {
            ids: &self.ids[..n + 1],
        }
    }
}

impl Default for ChapterIdPool {
    fn default() -> Self {
        Self::new()
    }
}

/// View of the first `n + 1` identifiers of a pool.
#[derive(Clone, Copy, Debug)]
pub struct ChapterIds<'a> {
    ids: &'a [u64],
}

impl<'a> ChapterIds<'a> {
    /// Identifier at `index`; negative indices count from the end, so `-1` is the edition UID.
    pub fn get(&self, index: isize) -> u64 {
        let len = self.ids.len() as isize;
        self.ids[index.rem_euclid(len) as usize]
    }

    pub fn uid(&self, index: isize) -> String {
        self.get(index).to_string()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &'a [u64] {
        self.ids
    }
}
