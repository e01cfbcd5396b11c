//! Builder for configuring and populating a [`HashRing`].

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use crate::partitioner::{FnPartitioner, HashAlgorithm, Partitioner, Sha256Partitioner};
use crate::ring::hash_ring::HashRing;

/// Builder for a [`HashRing`].
///
/// The partitioner chosen here is fixed for the lifetime of the ring.
///
/// ```rust
/// use hashring::RingBuilder;
/// use hashring::partitioner::HashAlgorithm;
///
/// let ring = RingBuilder::new()
///     .with_vnodes(64)
///     .with_replication_factor(2)
///     .with_hash_algorithm(HashAlgorithm::Xxh3)
///     .add_node("cache-1")
///     .add_weighted_node("cache-2", 2.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(ring.node_count(), 2);
/// assert_eq!(ring.token_count(), 64 + 128);
/// ```
#[derive(Clone)]
pub struct RingBuilder {
    vnode_count: usize,
    replication_factor: usize,
    partitioner: Arc<dyn Partitioner>,
    nodes: Vec<(NodeId, f64)>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            vnode_count: HashRing::DEFAULT_VNODE_COUNT,
            replication_factor: HashRing::DEFAULT_REPLICATION_FACTOR,
            partitioner: Arc::new(Sha256Partitioner),
            nodes: Vec::new(),
        }
    }

    /// Base vnode count for a node of weight 1.
    pub fn with_vnodes(mut self, vnode_count: usize) -> Self {
        self.vnode_count = vnode_count;
        self
    }

    pub fn with_replication_factor(mut self, replication_factor: usize) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    pub fn with_partitioner(self, partitioner: impl Partitioner) -> Self {
        self.with_shared_partitioner(Arc::new(partitioner))
    }

    pub fn with_shared_partitioner(mut self, partitioner: Arc<dyn Partitioner>) -> Self {
        self.partitioner = partitioner;
        self
    }

    pub fn with_hash_algorithm(self, algorithm: HashAlgorithm) -> Self {
        self.with_shared_partitioner(algorithm.partitioner())
    }

    /// Use a plain function as the hash.
    pub fn with_hash_fn<F>(self, hash: F) -> Self
    where
        F: Fn(&[u8]) -> u64 + Send + Sync + 'static,
    {
        self.with_partitioner(FnPartitioner::new(hash))
    }

    /// Queue a node of weight 1.0 to be added on [`build`](Self::build).
    pub fn add_node(self, node_id: impl Into<NodeId>) -> Self {
        self.add_weighted_node(node_id, Node::DEFAULT_WEIGHT)
    }

    pub fn add_weighted_node(mut self, node_id: impl Into<NodeId>, weight: f64) -> Self {
        self.nodes.push((node_id.into(), weight));
        self
    }

    /// Validate the configuration and add the queued nodes in order.
    pub fn build(self) -> Result<HashRing> {
        if self.vnode_count == 0 {
            return Err(Error::InvalidConfig("vnode count must be positive".to_string()));
        }
        if self.vnode_count > HashRing::MAX_VNODES_PER_NODE {
            return Err(Error::InvalidConfig(format!(
                "vnode count {} exceeds the limit of {}",
                self.vnode_count,
                HashRing::MAX_VNODES_PER_NODE
            )));
        }
        if self.replication_factor == 0 {
            return Err(Error::InvalidConfig(
                "replication factor must be positive".to_string(),
            ));
        }

        let mut ring = HashRing::from_parts(self.vnode_count, self.replication_factor, self.partitioner);
        for (node_id, weight) in self.nodes {
            ring.add_weighted_node(node_id, weight)?;
        }
        Ok(ring)
    }
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RingBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuilder")
            .field("vnode_count", &self.vnode_count)
            .field("replication_factor", &self.replication_factor)
            .field("partitioner", &self.partitioner.name())
            .field("nodes", &self.nodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let ring = RingBuilder::new().build().unwrap();
        assert_eq!(ring.vnode_count(), 100);
        assert_eq!(ring.replication_factor(), 3);
        assert_eq!(ring.partitioner_name(), "Sha256Partitioner");
        assert!(ring.is_empty());
    }

    #[test]
    fn test_builder_rejects_zero_counts() {
        assert!(matches!(
            RingBuilder::new().with_vnodes(0).build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            RingBuilder::new().with_replication_factor(0).build(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builder_rejects_oversized_vnode_count() {
        assert!(matches!(
            RingBuilder::new().with_vnodes(usize::MAX).build(),
            Err(Error::InvalidConfig(_))
        ));
        let ring = RingBuilder::new()
            .with_vnodes(HashRing::MAX_VNODES_PER_NODE)
            .build()
            .unwrap();
        assert_eq!(ring.vnode_count(), HashRing::MAX_VNODES_PER_NODE);
    }

    #[test]
    fn test_builder_propagates_node_errors() {
        let result = RingBuilder::new().add_node("A").add_node("A").build();
        assert_eq!(result.unwrap_err(), Error::DuplicateNode(NodeId::from("A")));
    }
}
