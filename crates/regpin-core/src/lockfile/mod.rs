//! Flake lock file reading.
//!
//! Parses a project's pinned dependency graph and exposes the locked
//! source descriptor for a named input. The lock file is read-only input
//! and never mutated.

pub mod types;

pub use types::{GithubSource, LockFile, LockNode, LockedRef};
