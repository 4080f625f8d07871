//! Run-scoped scratch directory.
//!
//! Acquired once per pipeline run and removed when released. Dropping the
//! guard without releasing it (early return, `?`) removes it as well.

use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::debug;

/// Scratch directory guard
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp dir
    pub fn acquire(prefix: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        debug!(path = %dir.path().display(), "Acquired scratch directory");
        Ok(Self { dir })
    }

    /// Path of the directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory, reporting any removal error
    pub fn release(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("Failed to remove scratch directory: {}", path.display()))?;
        debug!(path = %path.display(), "Released scratch directory");
        Ok(())
    }
}
