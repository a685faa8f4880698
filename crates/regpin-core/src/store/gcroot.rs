//! Garbage-collection roots for prefetched store paths.
//!
//! A named symlink under the per-user gcroots directory keeps the store
//! path alive between runs.

use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct GcRootStore {
    roots_dir: PathBuf,
}

impl GcRootStore {
    /// Create a GC root store with an explicit roots directory.
    pub fn new(roots_dir: PathBuf) -> Self {
        Self { roots_dir }
    }

    /// The conventional per-user roots directory.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let user = std::env::var("USER").context("USER is not set")?;
        Ok(Self::new(
            Path::new("/nix/var/nix/gcroots/per-user").join(user),
        ))
    }

    pub fn roots_dir(&self) -> &Path {
        &self.roots_dir
    }

    /// Point the named root at `target`, replacing any previous link.
    pub fn register(&self, name: &str, target: &Path) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.roots_dir).with_context(|| {
            format!(
                "Failed to create gcroots directory: {}",
                self.roots_dir.display()
            )
        })?;

        let link = self.roots_dir.join(name);
        match std::fs::remove_file(&link) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove old GC root: {}", link.display()));
            }
        }

        symlink(target, &link)
            .with_context(|| format!("Failed to add GC root: {}", link.display()))?;
        Ok(link)
    }
}
