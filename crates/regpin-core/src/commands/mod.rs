//! High-level commands for regpin operations.
//!
//! This module provides the public API for orchestrating the pin
//! operation, designed to be called by frontends.

pub mod pin;

pub use pin::{DEFAULT_ENTRY, DEFAULT_LOCK_FILE, PinCommand, PinOptions, PinReport};
