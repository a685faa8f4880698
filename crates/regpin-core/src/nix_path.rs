//! NIX_PATH hint file generation.
//!
//! The hint file is a plain shell fragment exporting `NIX_PATH` so that
//! channel-style lookups (`<nixpkgs>`) resolve to the pinned store path.
//! The exported value is computed here by merging the invoking
//! environment's search path with the pinned entry; the file itself is a
//! simple assignment, valid in any POSIX shell. Sourcing it from a shell
//! profile is the user's opt-in. Fully overwritten each run.

use std::path::{Path, PathBuf};

use anyhow::Context;

/// Replace or append the `name=` element of a colon-delimited search path.
///
/// Elements without a `name=` prefix (bare directories) are preserved
/// untouched.
pub fn merge_search_path(existing: Option<&str>, name: &str, path: &Path) -> String {
    let pinned = format!("{}={}", name, path.display());

    let mut elements: Vec<String> = existing
        .unwrap_or_default()
        .split(':')
        .filter(|element| !element.is_empty())
        .map(str::to_string)
        .collect();

    let slot = elements
        .iter()
        .position(|element| element.split_once('=').map(|(key, _)| key) == Some(name));
    match slot {
        Some(idx) => elements[idx] = pinned,
        None => elements.push(pinned),
    }

    elements.join(":")
}

/// The hint file holding the `export NIX_PATH=` fragment.
#[derive(Debug, Clone)]
pub struct HintFile {
    path: PathBuf,
}

impl HintFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The conventional location, `~/.nix-path`.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self::new(home.join(".nix-path")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the hint file with an export of `value`.
    pub fn write(&self, value: &str) -> anyhow::Result<()> {
        let snippet = format!("export NIX_PATH=\"{value}\"\n");
        std::fs::write(&self.path, snippet)
            .with_context(|| format!("Failed to write hint file: {}", self.path.display()))
    }
}
