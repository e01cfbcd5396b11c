//! Weighted consistent hash ring.
//!
//! This crate provides the ring engine and the pieces around it:
//! - Node identifiers and weighted physical nodes
//! - Tokens (positions on the 64-bit ring) and virtual nodes
//! - Pluggable partitioners (hash functions)
//! - The `HashRing` engine with single-owner and replica-set lookup
//! - Declarative configuration and topology analysis
//!
//! ```rust
//! use hashring::HashRing;
//!
//! let mut ring = HashRing::new();
//! for node in ["A", "B", "C"] {
//!     ring.add_node(node)?;
//! }
//!
//! let owner = ring.get_node("user:1")?;
//! let replicas = ring.get_nodes_for_key("user:1", None)?;
//! assert_eq!(replicas.len(), 3);
//!
//! ring.remove_node(owner.as_str())?;
//! let successor = ring.get_node("user:1")?;
//! assert_eq!(successor, replicas[1]);
//! # Ok::<(), hashring::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod topology;
pub mod vnode;

pub use config::{NodeConfig, RingConfig};
pub use error::{Error, Result};
pub use node::{Node, NodeId};
pub use partitioner::{HashAlgorithm, Partitioner};
pub use ring::{HashRing, Ring, RingBuilder};
pub use token::Token;
pub use topology::{KeyDistribution, Migration, Topology};
pub use vnode::VirtualNode;
