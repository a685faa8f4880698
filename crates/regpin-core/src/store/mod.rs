//! Nix store integration.
//!
//! Prefetches pinned sources into the local content-addressed store and
//! pins the resulting paths against garbage collection.

pub mod gcroot;
pub mod prefetch;

pub use gcroot::GcRootStore;
pub use prefetch::{NixPrefetch, StorePathResolver};
