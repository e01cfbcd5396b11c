//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Instead of each physical node having a single token on the ring, each node
//! has multiple tokens (virtual nodes). This provides:
//!
//! 1. **Better Load Distribution**: More tokens = smoother distribution of keys
//! 2. **Gradual Rebalancing**: When nodes join/leave, only a fraction of keys move
//! 3. **Weighting**: A node's share of the ring scales with its vnode count
//!
//! # Placement
//!
//! Vnode `i` of node `n` is placed at `hash("{n}#{i}")`. If that position is
//! already taken, the candidate for attempt `k` is `hash("{n}#{i}_{k}")`.
//! Candidates are a pure function of `(node, index, attempt)`, so replaying
//! the same sequence of additions always rebuilds the same ring.

use std::fmt;

use crate::node::NodeId;
use crate::partitioner::Partitioner;
use crate::token::Token;

/// Maximum number of candidate positions tried for one vnode.
pub const MAX_PROBE_ATTEMPTS: usize = 64;

/// A virtual node on the hash ring.
///
/// # Invariants
///
/// - Every `VirtualNode` in a ring has a unique token
/// - Every `VirtualNode` belongs to exactly one physical node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: Token,

    /// The physical node that owns this virtual node.
    pub node_id: NodeId,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: Token, node_id: NodeId) -> Self {
        Self { token, node_id }
    }

    /// Hash the candidate key for `(node_id, vnode_index, attempt)`.
    pub fn candidate(
        partitioner: &dyn Partitioner,
        node_id: &NodeId,
        vnode_index: usize,
        attempt: usize,
    ) -> Token {
        partitioner.partition(vnode_key(node_id, vnode_index, attempt).as_bytes())
    }

    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }
}

impl fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VNode(token={}, node={})", self.token, self.node_id)
    }
}

/// The string hashed to place vnode `vnode_index` of `node_id` on probe
/// `attempt`.
pub fn vnode_key(node_id: &NodeId, vnode_index: usize, attempt: usize) -> String {
    if attempt == 0 {
        format!("{node_id}#{vnode_index}")
    } else {
        format!("{node_id}#{vnode_index}_{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::Sha256Partitioner;

    #[test]
    fn test_vnode_key_format() {
        let id = NodeId::from("A");
        assert_eq!(vnode_key(&id, 0, 0), "A#0");
        assert_eq!(vnode_key(&id, 17, 0), "A#17");
        assert_eq!(vnode_key(&id, 17, 2), "A#17_2");
    }

    #[test]
    fn test_candidates_differ_per_index_and_attempt() {
        let id = NodeId::from("node-1");
        let p = Sha256Partitioner;
        let first = VirtualNode::candidate(&p, &id, 0, 0);
        assert_eq!(first, VirtualNode::candidate(&p, &id, 0, 0));
        assert_ne!(first, VirtualNode::candidate(&p, &id, 1, 0));
        assert_ne!(first, VirtualNode::candidate(&p, &id, 0, 1));
    }

    #[test]
    fn test_vnode_ordering() {
        let a = VirtualNode::new(Token(100), NodeId::from("b"));
        let b = VirtualNode::new(Token(200), NodeId::from("a"));
        assert!(a < b); // Ordered by token first
    }
}
