//! Error types for the ring engine.

use crate::node::NodeId;

/// Result type alias for the ring engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mutating or querying a ring.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A lookup was made on a ring with no nodes.
    #[error("the hash ring has no nodes")]
    EmptyRing,

    /// The node is not part of the ring.
    #[error("node '{0}' is not in the ring")]
    NodeNotFound(NodeId),

    /// The node is already part of the ring.
    #[error("node '{0}' is already in the ring")]
    DuplicateNode(NodeId),

    /// Weight must be a positive, finite number small enough that the node's
    /// vnode count stays within `HashRing::MAX_VNODES_PER_NODE`.
    #[error("invalid weight {weight} for node '{node_id}': must be positive and finite, and fit the per-node vnode limit")]
    InvalidWeight {
        /// Node the weight was given for.
        node_id: NodeId,
        /// The rejected weight.
        weight: f64,
    },

    /// Invalid node identifier.
    #[error("invalid node: {0}")]
    InvalidNode(String),

    /// Invalid ring configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No free position was found for a vnode within the probe limit.
    #[error("no free ring position for vnode {replica_index} of node '{node_id}'")]
    PositionsExhausted {
        /// Node being placed.
        node_id: NodeId,
        /// Replica index whose candidates all collided.
        replica_index: usize,
    },
}
