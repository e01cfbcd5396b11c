//! Declarative ring configuration.
//!
//! A [`RingConfig`] describes the ring parameters and the initial set of
//! weighted nodes. It deserializes from JSON:
//!
//! ```json
//! {
//!   "vnode_count": 100,
//!   "replication_factor": 3,
//!   "hash": "sha256",
//!   "nodes": [
//!     { "id": "cache-a" },
//!     { "id": "cache-b", "weight": 2.0 }
//!   ]
//! }
//! ```
//!
//! Every field is optional. This is a description of how to build a ring,
//! not a snapshot of one; positions are always recomputed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use crate::partitioner::HashAlgorithm;
use crate::ring::{HashRing, RingBuilder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingConfig {
    /// Base vnode count for a node of weight 1.
    pub vnode_count: usize,
    pub replication_factor: usize,
    pub hash: HashAlgorithm,
    pub nodes: Vec<NodeConfig>,
}

/// One `nodes[]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub id: NodeId,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    Node::DEFAULT_WEIGHT
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            vnode_count: HashRing::DEFAULT_VNODE_COUNT,
            replication_factor: HashRing::DEFAULT_REPLICATION_FACTOR,
            hash: HashAlgorithm::default(),
            nodes: Vec::new(),
        }
    }
}

impl RingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(format!("malformed ring config: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read ring config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// A builder carrying these settings and nodes.
    pub fn builder(&self) -> RingBuilder {
        self.nodes.iter().fold(
            RingBuilder::new()
                .with_vnodes(self.vnode_count)
                .with_replication_factor(self.replication_factor)
                .with_hash_algorithm(self.hash),
            |builder, node| builder.add_weighted_node(node.id.clone(), node.weight),
        )
    }

    /// Build the described ring, failing on the first invalid setting or node.
    pub fn build(&self) -> Result<HashRing> {
        self.builder().build()
    }
}
