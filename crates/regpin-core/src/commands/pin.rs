//! Pin command implementation.
//!
//! Synchronizes one registry entry with the descriptor pinned in a
//! project lock file, then optionally prefetches the source into the
//! local store and rewrites the NIX_PATH hint file.

use std::path::PathBuf;

use crate::error::PinError;
use crate::lockfile::{LockFile, LockedRef};
use crate::nix_path::{HintFile, merge_search_path};
use crate::registry::RegistryStore;
use crate::store::{GcRootStore, NixPrefetch, StorePathResolver};

/// The entry tracked when none is named.
pub const DEFAULT_ENTRY: &str = "nixpkgs";

/// The lock file read when none is named.
pub const DEFAULT_LOCK_FILE: &str = "flake.lock";

/// Options for a pin run.
///
/// All paths are explicit; frontends resolve defaults before building
/// options.
#[derive(Debug, Clone)]
pub struct PinOptions {
    /// Lock file to read the pinned descriptor from
    pub lock_file: PathBuf,
    /// Entry name to copy into the registry
    pub entry_name: String,
    /// Registry file to update
    pub registry_file: PathBuf,
    /// Whether to prefetch the source and update the hint file
    pub prefetch: bool,
}

impl PinOptions {
    pub fn new(registry_file: impl Into<PathBuf>) -> Self {
        Self {
            lock_file: PathBuf::from(DEFAULT_LOCK_FILE),
            entry_name: DEFAULT_ENTRY.to_string(),
            registry_file: registry_file.into(),
            prefetch: true,
        }
    }

    pub fn with_lock_file(mut self, lock_file: impl Into<PathBuf>) -> Self {
        self.lock_file = lock_file.into();
        self
    }

    pub fn with_entry_name(mut self, entry_name: impl Into<String>) -> Self {
        self.entry_name = entry_name.into();
        self
    }

    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }
}

/// Result of a pin run.
#[derive(Debug)]
pub struct PinReport {
    /// Entry that was pinned
    pub entry_name: String,
    /// Descriptor now registered for the entry
    pub to: LockedRef,
    /// Registry file that was written
    pub registry_file: PathBuf,
    /// Resolved store path, when prefetch ran and succeeded
    pub store_path: Option<PathBuf>,
    /// Hint file path, when it was rewritten
    pub hint_file: Option<PathBuf>,
    /// Non-fatal conditions encountered along the way
    pub warnings: Vec<String>,
}

/// Pin command orchestrator.
///
/// The registry and lock file locations travel in the options; the
/// command holds the environment-shaped collaborators so tests can
/// substitute them.
pub struct PinCommand {
    hint_file: HintFile,
    gc_roots: GcRootStore,
    resolver: Box<dyn StorePathResolver>,
    search_path: Option<String>,
}

impl PinCommand {
    /// Create a pin command with explicit collaborators.
    pub fn new(
        hint_file: HintFile,
        gc_roots: GcRootStore,
        resolver: Box<dyn StorePathResolver>,
        search_path: Option<String>,
    ) -> Self {
        Self {
            hint_file,
            gc_roots,
            resolver,
            search_path,
        }
    }

    /// Create a pin command wired to the real environment: `~/.nix-path`,
    /// the per-user gcroots directory, `nix-prefetch-url`, and the
    /// current `NIX_PATH` value.
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(
            HintFile::with_defaults()?,
            GcRootStore::with_defaults()?,
            Box::new(NixPrefetch::new()),
            std::env::var("NIX_PATH").ok(),
        ))
    }

    /// Execute the pin: lock file -> registry -> (optional) store.
    ///
    /// The registry save is the single durable mutation; it only happens
    /// after the in-memory update succeeds. Everything after it is
    /// non-fatal.
    pub fn execute(&self, options: &PinOptions) -> anyhow::Result<PinReport> {
        let lock = LockFile::load(&options.lock_file)?;
        let locked = lock
            .locked(&options.entry_name)
            .cloned()
            .ok_or_else(|| PinError::EntryNotFound {
                entry: options.entry_name.clone(),
                path: options.lock_file.clone(),
            })?;

        let store = RegistryStore::new(options.registry_file.clone());
        let mut registry = store.load();
        registry.pin(&options.entry_name, locked.clone());
        store.save(&registry)?;

        let mut report = PinReport {
            entry_name: options.entry_name.clone(),
            to: locked.clone(),
            registry_file: options.registry_file.clone(),
            store_path: None,
            hint_file: None,
            warnings: Vec::new(),
        };

        if options.prefetch && options.entry_name == DEFAULT_ENTRY && locked.is_github() {
            self.update_search_path(&options.entry_name, &locked, &mut report);
        }

        Ok(report)
    }

    /// Prefetch the pinned source and point the NIX_PATH hint at it.
    ///
    /// Failures here leave the registry update intact and are reported
    /// as warnings.
    fn update_search_path(&self, entry: &str, locked: &LockedRef, report: &mut PinReport) {
        let Some(source) = locked.github_source() else {
            report.warnings.push(format!(
                "skipping NIX_PATH update: '{entry}' is missing owner, repo, rev, or narHash"
            ));
            return;
        };

        let url = match source.archive_url() {
            Ok(url) => url,
            Err(e) => {
                report
                    .warnings
                    .push(format!("skipping NIX_PATH update: {e:#}"));
                return;
            }
        };

        let store_path = match self.resolver.resolve(&url, &source.nar_hash, entry) {
            Ok(path) => path,
            Err(e) => {
                report.warnings.push(format!(
                    "skipping NIX_PATH update, unable to download {entry}: {e:#}"
                ));
                return;
            }
        };
        report.store_path = Some(store_path.clone());

        if let Err(e) = self.gc_roots.register(&format!("regpin-{entry}"), &store_path) {
            report.warnings.push(format!("{e:#}"));
        }

        let value = merge_search_path(self.search_path.as_deref(), entry, &store_path);
        match self.hint_file.write(&value) {
            Ok(()) => report.hint_file = Some(self.hint_file.path().to_path_buf()),
            Err(e) => report.warnings.push(format!("{e:#}")),
        }
    }
}
