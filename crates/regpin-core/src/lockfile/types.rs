//! Lock file types and the locked descriptor they carry.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::PinError;

/// Parsed flake.lock document.
///
/// Only the node graph is of interest here; top-level bookkeeping fields
/// (`root`, `version`) are ignored on read.
#[derive(Debug, Clone, Deserialize)]
pub struct LockFile {
    /// Dependency nodes keyed by logical input name.
    #[serde(default)]
    pub nodes: HashMap<String, LockNode>,
}

impl LockFile {
    /// Read and parse a lock file.
    pub fn load(path: &Path) -> Result<Self, PinError> {
        let bytes = std::fs::read(path).map_err(|e| PinError::LockFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| PinError::LockFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Look up the locked descriptor for a named input.
    ///
    /// Returns `None` for unknown inputs and for nodes without a `locked`
    /// sub-record (the root node, unresolved indirections).
    pub fn locked(&self, entry: &str) -> Option<&LockedRef> {
        self.nodes.get(entry).and_then(|node| node.locked.as_ref())
    }
}

/// A single node in the lock file graph.
#[derive(Debug, Clone, Deserialize)]
pub struct LockNode {
    /// Resolved source descriptor, absent on the root node.
    #[serde(default)]
    pub locked: Option<LockedRef>,
}

/// A locked source descriptor identifying an immutable snapshot.
///
/// Known fields are typed; everything else (lastModified, ref, ...) is kept
/// in `extra` so the descriptor round-trips verbatim into the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedRef {
    /// Origin type, e.g. "github" or "indirect".
    #[serde(rename = "type")]
    pub ref_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Resolved revision (exact commit SHA for github sources).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Content hash of the unpacked source tree.
    #[serde(rename = "narHash", skip_serializing_if = "Option::is_none")]
    pub nar_hash: Option<String>,

    /// Any further descriptor fields, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LockedRef {
    pub fn is_github(&self) -> bool {
        self.ref_type == "github"
    }

    /// Extract GitHub coordinates, if this descriptor is a complete
    /// github source (type, owner, repo, rev, and narHash all present).
    pub fn github_source(&self) -> Option<GithubSource> {
        if !self.is_github() {
            return None;
        }
        Some(GithubSource {
            owner: self.owner.clone()?,
            repo: self.repo.clone()?,
            rev: self.rev.clone()?,
            nar_hash: self.nar_hash.clone()?,
        })
    }
}

/// GitHub coordinates extracted from a locked descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubSource {
    pub owner: String,
    pub repo: String,
    pub rev: String,
    pub nar_hash: String,
}

impl GithubSource {
    /// Canonical source archive URL for this revision.
    pub fn archive_url(&self) -> anyhow::Result<Url> {
        let raw = format!(
            "https://github.com/{}/{}/archive/{}.zip",
            self.owner, self.repo, self.rev
        );
        Url::parse(&raw).with_context(|| format!("Invalid archive URL: {raw}"))
    }
}
