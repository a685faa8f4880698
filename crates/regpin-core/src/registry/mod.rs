//! User registry document and persistence.
//!
//! The registry maps short indirect names to resolved source descriptors
//! and is consulted by downstream tooling. Only schema version 2 is
//! recognized.

pub mod schema;
pub mod store;

pub use schema::{FlakeId, REGISTRY_VERSION, Registry, RegistryEntry};
pub use store::{LoadOutcome, RegistryStore};
