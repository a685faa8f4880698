//! Registry store for loading and saving the registry file.
//!
//! Reads heal: an absent, unreadable, malformed, or wrong-version file
//! yields a fresh empty document, since the write path reconstructs the
//! full entry set anyway. Writes never heal: a failed save is fatal,
//! otherwise the user would believe the pin succeeded.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::PinError;

use super::Registry;

/// Categorized result of reading the registry file.
#[derive(Debug)]
pub enum LoadOutcome {
    /// A valid version-2 document was read.
    Loaded(Registry),
    /// The file does not exist.
    Absent,
    /// The file exists but could not be used (unreadable, bad JSON,
    /// unsupported version).
    Invalid { reason: String },
}

impl LoadOutcome {
    /// Collapse to a usable document; anything but `Loaded` starts fresh.
    pub fn into_registry(self) -> Registry {
        match self {
            LoadOutcome::Loaded(registry) => registry,
            LoadOutcome::Absent => Registry::new(),
            LoadOutcome::Invalid { reason } => {
                tracing::debug!(%reason, "discarding unusable registry, starting fresh");
                Registry::new()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the registry file and categorize the result.
    pub fn inspect(&self) -> LoadOutcome {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::Absent,
            Err(e) => {
                return LoadOutcome::Invalid {
                    reason: e.to_string(),
                };
            }
        };

        let registry: Registry = match serde_json::from_slice(&bytes) {
            Ok(registry) => registry,
            Err(e) => {
                return LoadOutcome::Invalid {
                    reason: e.to_string(),
                };
            }
        };

        match registry.validate() {
            Ok(()) => LoadOutcome::Loaded(registry),
            Err(e) => LoadOutcome::Invalid {
                reason: e.to_string(),
            },
        }
    }

    /// Load the registry, starting fresh on any read failure.
    pub fn load(&self) -> Registry {
        self.inspect().into_registry()
    }

    /// Serialize with 2-space indentation and overwrite the file.
    pub fn save(&self, registry: &Registry) -> Result<(), PinError> {
        let persist_err = |reason: String| PinError::Persist {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;
        }

        let bytes = serde_json::to_vec_pretty(registry).map_err(|e| persist_err(e.to_string()))?;
        std::fs::write(&self.path, bytes).map_err(|e| persist_err(e.to_string()))
    }
}
