//! Regpin Core Library
//!
//! Provides the domain logic for synchronizing a per-user Nix registry
//! entry with the version pinned in a project flake.lock, and for
//! prefetching that version into the local store.

pub mod commands;
pub mod error;
pub mod lockfile;
pub mod nix_path;
pub mod registry;
pub mod store;

/// Re-exports of commonly used types
pub mod prelude {
    // Commands
    pub use crate::commands::{PinCommand, PinOptions, PinReport};

    // Errors
    pub use crate::error::PinError;

    // Lockfile
    pub use crate::lockfile::{GithubSource, LockFile, LockNode, LockedRef};

    // Registry
    pub use crate::registry::{FlakeId, LoadOutcome, Registry, RegistryEntry, RegistryStore};

    // Store
    pub use crate::store::{GcRootStore, NixPrefetch, StorePathResolver};

    // NIX_PATH hint
    pub use crate::nix_path::{HintFile, merge_search_path};
}
