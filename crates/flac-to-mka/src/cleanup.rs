//! Generated files that are deleted unless a stage decides to keep them.
//!
//! Every sidecar is created through [`CleanupRegistry::own`], which hands
//! back an [`OutputFile`] guard. Dropping the guard deletes the file; calling
//! [`OutputFile::keep`] transfers it to the user. The registry also remembers
//! every live guard so the Ctrl-C handler can remove them before exiting.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Default)]
pub struct CleanupRegistry {
    paths: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `path`; it is deleted when the guard drops.
    pub fn own(&self, path: impl Into<PathBuf>) -> OutputFile {
        let path = path.into();
        if let Ok(mut paths) = self.paths.lock() {
            paths.insert(path.clone());
        }
        OutputFile {
            path,
            registry: self.clone(),
            keep: false,
        }
    }

    fn forget(&self, path: &Path) {
        if let Ok(mut paths) = self.paths.lock() {
            paths.remove(path);
        }
    }

    /// Paths that would be deleted right now.
    #[cfg(test)]
    pub fn pending(&self) -> Vec<PathBuf> {
        self.paths
            .lock()
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Delete every registered file. Returns how many were removed.
    pub fn clean_all(&self) -> usize {
        let paths = match self.paths.lock() {
            Ok(mut paths) => std::mem::take(&mut *paths),
            Err(_) => return 0,
        };
        paths.iter().filter(|path| remove_if_exists(path)).count()
    }
}

fn remove_if_exists(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "deleted");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "delete failed: {e}");
            false
        }
    }
}

/// Scope guard for one generated file.
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    registry: CleanupRegistry,
    keep: bool,
}

impl OutputFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now if it exists, keeping the guard.
    pub fn discard(&self) {
        remove_if_exists(&self.path);
    }

    /// Keep the file after the run.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.registry.forget(&self.path);
        std::mem::take(&mut self.path)
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        self.registry.forget(&self.path);
        remove_if_exists(&self.path);
    }
}
