//! Archive prefetching via the external `nix-prefetch-url` utility.

use std::path::PathBuf;
use std::process::Command;

use anyhow::Context;
use url::Url;

/// Resolves a source archive to a local store path.
///
/// Implementations download (or confirm by hash) the archive and return
/// the unpacked store location. The subprocess-facing implementation is
/// kept behind this seam so its output contract stays swappable.
pub trait StorePathResolver {
    fn resolve(&self, url: &Url, nar_hash: &str, name: &str) -> anyhow::Result<PathBuf>;
}

/// Store path resolver backed by the `nix-prefetch-url` CLI.
#[derive(Debug, Clone)]
pub struct NixPrefetch {
    program: PathBuf,
}

impl NixPrefetch {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("nix-prefetch-url"),
        }
    }

    /// Use an alternate prefetch executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NixPrefetch {
    fn default() -> Self {
        Self::new()
    }
}

impl StorePathResolver for NixPrefetch {
    fn resolve(&self, url: &Url, nar_hash: &str, name: &str) -> anyhow::Result<PathBuf> {
        tracing::debug!(url = %url, name, "invoking prefetch");
        let output = Command::new(&self.program)
            .arg(url.as_str())
            .arg(nar_hash)
            .args(["--name", name, "--unpack", "--print-path"])
            .output()
            .with_context(|| format!("Failed to invoke {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} failed with {} ({})",
                self.program.display(),
                output.status,
                stderr.trim()
            );
        }

        parse_store_path(&String::from_utf8_lossy(&output.stdout))
    }
}

/// With `--print-path`, the utility prints the archive hash on the first
/// line and the unpacked store path on the second.
fn parse_store_path(stdout: &str) -> anyhow::Result<PathBuf> {
    let path = stdout
        .lines()
        .nth(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .ok_or_else(|| anyhow::anyhow!("No store path in prefetch output: {stdout:?}"))?;
    Ok(PathBuf::from(path))
}
