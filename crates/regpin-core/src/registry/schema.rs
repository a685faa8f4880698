//! Registry document schema.

use serde::{Deserialize, Serialize};

use crate::lockfile::LockedRef;

/// The single registry schema version this tool recognizes.
pub const REGISTRY_VERSION: u32 = 2;

/// A user registry document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    /// Registry format version
    pub version: u32,

    /// Registered entries, in insertion order.
    #[serde(default)]
    pub flakes: Vec<RegistryEntry>,
}

impl Registry {
    /// Create a new empty registry document.
    pub fn new() -> Self {
        Self {
            version: REGISTRY_VERSION,
            flakes: Vec::new(),
        }
    }

    /// Validate the document version.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.version != REGISTRY_VERSION {
            anyhow::bail!("Unsupported registry version: {}", self.version);
        }
        Ok(())
    }

    /// Get the entry registered under `id`.
    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.flakes.iter().find(|entry| entry.from.id == id)
    }

    /// Point `id` at a new descriptor.
    ///
    /// Removes the first existing entry with that id (later duplicates
    /// from a corrupted document are left alone) and appends the new
    /// entry at the end. Pure in-memory mutation, no I/O.
    pub fn pin(&mut self, id: &str, to: LockedRef) {
        if let Some(idx) = self.flakes.iter().position(|entry| entry.from.id == id) {
            self.flakes.remove(idx);
        }
        self.flakes.push(RegistryEntry {
            from: FlakeId::indirect(id),
            to,
        });
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// One registry entry mapping an indirect name to a descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub from: FlakeId,

    /// The descriptor, copied verbatim from the lock file.
    pub to: LockedRef,
}

/// The indirect name an entry is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlakeId {
    #[serde(rename = "type")]
    pub ref_type: String,

    pub id: String,
}

impl FlakeId {
    /// An indirect reference to `id`.
    pub fn indirect(id: impl Into<String>) -> Self {
        Self {
            ref_type: "indirect".to_string(),
            id: id.into(),
        }
    }
}
