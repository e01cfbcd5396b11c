//! Consistent hash ring implementation.
//!
//! The ring manages vnode positions and provides efficient lookup
//! operations for finding the nodes responsible for keys.

pub mod builder;
pub mod hash_ring;

pub use builder::RingBuilder;
pub use hash_ring::HashRing;

/// Alias for the main ring type (used by lib.rs).
pub type Ring = HashRing;
