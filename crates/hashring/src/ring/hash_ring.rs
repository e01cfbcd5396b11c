//! Hash ring data structure.
//!
//! Positions live in a single `BTreeMap<Token, NodeId>`. A lookup is a range
//! query for the first position at or after the key's token, wrapping to the
//! smallest position when the key hashes past the last one.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use crate::partitioner::{Partitioner, Sha256Partitioner};
use crate::ring::builder::RingBuilder;
use crate::token::Token;
use crate::vnode::{vnode_key, VirtualNode, MAX_PROBE_ATTEMPTS};

/// Physical node record plus the positions it occupies.
///
/// Positions are stored rather than recomputed on removal because collision
/// probing makes them depend on what else was on the ring at insert time.
#[derive(Clone, Debug)]
struct Member {
    node: Node,
    tokens: Vec<Token>,
}

/// Weighted consistent hash ring.
///
/// Mutation takes `&mut self` and lookups take `&self`; the ring does no
/// locking of its own. It is `Clone + Send + Sync`, so callers that need
/// shared access can put it behind a lock or publish cloned snapshots.
///
/// # Example
///
/// ```rust
/// use hashring::HashRing;
///
/// let mut ring = HashRing::new();
/// ring.add_node("A").unwrap();
/// ring.add_node("B").unwrap();
/// ring.add_weighted_node("C", 2.0).unwrap();
///
/// let owner = ring.get_node("user:1").unwrap();
/// let replicas = ring.get_nodes_for_key("user:1", None).unwrap();
/// assert_eq!(replicas[0], owner);
/// assert_eq!(replicas.len(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct HashRing {
    /// Vnode positions: ring position -> physical node.
    vnodes: BTreeMap<Token, NodeId>,
    /// Physical nodes keyed by id.
    nodes: HashMap<NodeId, Member>,
    /// Base vnode count for a node of weight 1.
    vnode_count: usize,
    /// Default replica set size for `get_nodes_for_key`.
    replication_factor: usize,
    partitioner: Arc<dyn Partitioner>,
}

impl HashRing {
    pub const DEFAULT_VNODE_COUNT: usize = 100;
    pub const DEFAULT_REPLICATION_FACTOR: usize = 3;
    /// Upper bound on the vnodes one node may hold. Weights that would scale
    /// past it are rejected, as is a larger base vnode count.
    pub const MAX_VNODES_PER_NODE: usize = 1 << 20;

    /// Create an empty ring with 100 vnodes per unit weight, replication
    /// factor 3 and the SHA-256 partitioner.
    pub fn new() -> Self {
        Self::from_parts(
            Self::DEFAULT_VNODE_COUNT,
            Self::DEFAULT_REPLICATION_FACTOR,
            Arc::new(Sha256Partitioner),
        )
    }

    pub fn builder() -> RingBuilder {
        RingBuilder::new()
    }

    /// Callers are responsible for validating the counts; see
    /// [`RingBuilder::build`].
    pub(crate) fn from_parts(
        vnode_count: usize,
        replication_factor: usize,
        partitioner: Arc<dyn Partitioner>,
    ) -> Self {
        Self {
            vnodes: BTreeMap::new(),
            nodes: HashMap::new(),
            vnode_count,
            replication_factor,
            partitioner,
        }
    }

    /// Number of vnodes a node of the given weight receives.
    ///
    /// `round(vnode_count * weight)`, rounding halves away from zero, never
    /// less than one and saturating at [`MAX_VNODES_PER_NODE`](Self::MAX_VNODES_PER_NODE).
    pub fn vnodes_for_weight(&self, weight: f64) -> usize {
        self.checked_vnodes_for_weight(weight)
            .unwrap_or(Self::MAX_VNODES_PER_NODE)
    }

    /// Like [`vnodes_for_weight`](Self::vnodes_for_weight) but `None` when the
    /// count would exceed the per-node limit.
    fn checked_vnodes_for_weight(&self, weight: f64) -> Option<usize> {
        let scaled = (self.vnode_count as f64 * weight).round();
        if scaled > Self::MAX_VNODES_PER_NODE as f64 {
            None
        } else if scaled < 1.0 {
            Some(1)
        } else {
            Some(scaled as usize)
        }
    }

    /// Add a node with the default weight of 1.0.
    pub fn add_node(&mut self, node_id: impl Into<NodeId>) -> Result<()> {
        self.add_weighted_node(node_id, Node::DEFAULT_WEIGHT)
    }

    /// Add a node whose vnode count is scaled by `weight`.
    ///
    /// Fails without touching the ring if the id is empty or already present,
    /// the weight is not a positive finite number or scales past
    /// [`MAX_VNODES_PER_NODE`](Self::MAX_VNODES_PER_NODE), or a vnode cannot
    /// be placed.
    pub fn add_weighted_node(&mut self, node_id: impl Into<NodeId>, weight: f64) -> Result<()> {
        let node_id = node_id.into();
        if node_id.as_str().is_empty() {
            return Err(Error::InvalidNode("node id must not be empty".to_string()));
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::InvalidWeight { node_id, weight });
        }
        let Some(count) = self.checked_vnodes_for_weight(weight) else {
            return Err(Error::InvalidWeight { node_id, weight });
        };
        if self.nodes.contains_key(&node_id) {
            return Err(Error::DuplicateNode(node_id));
        }

        let tokens = self.place_vnodes(&node_id, count)?;
        for token in &tokens {
            self.vnodes.insert(*token, node_id.clone());
        }

        let node = Node {
            id: node_id.clone(),
            weight,
            vnodes: count,
        };
        self.nodes.insert(node_id.clone(), Member { node, tokens });
        debug!(%node_id, weight, vnodes = count, total_vnodes = self.vnodes.len(), "added node to ring");
        Ok(())
    }

    /// Compute every position for a new node before any is inserted, so a
    /// failed placement leaves the ring as it was.
    fn place_vnodes(&self, node_id: &NodeId, count: usize) -> Result<Vec<Token>> {
        let mut pending = BTreeSet::new();
        let mut tokens = Vec::with_capacity(count);

        for vnode_index in 0..count {
            let token = self.probe(node_id, vnode_index, &pending)?;
            pending.insert(token);
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn probe(
        &self,
        node_id: &NodeId,
        vnode_index: usize,
        pending: &BTreeSet<Token>,
    ) -> Result<Token> {
        for attempt in 0..MAX_PROBE_ATTEMPTS {
            let token = VirtualNode::candidate(&*self.partitioner, node_id, vnode_index, attempt);
            if !self.vnodes.contains_key(&token) && !pending.contains(&token) {
                return Ok(token);
            }
            warn!(
                vnode = %vnode_key(node_id, vnode_index, attempt),
                %token,
                "vnode position collision, retrying with salt"
            );
        }

        Err(Error::PositionsExhausted {
            node_id: node_id.clone(),
            replica_index: vnode_index,
        })
    }

    /// Remove a node and every vnode it owns.
    pub fn remove_node(&mut self, node_id: &str) -> Result<()> {
        let Some((node_id, member)) = self.nodes.remove_entry(node_id) else {
            return Err(Error::NodeNotFound(NodeId::new(node_id)));
        };

        for token in &member.tokens {
            self.vnodes.remove(token);
        }
        debug!(%node_id, vnodes = member.tokens.len(), total_vnodes = self.vnodes.len(), "removed node from ring");
        Ok(())
    }

    /// Position of `key` on the ring.
    #[inline]
    pub fn token_for_key(&self, key: &str) -> Token {
        self.partitioner.partition(key.as_bytes())
    }

    /// Vnodes in clockwise order starting at the first position `>= start`.
    fn walk_from(&self, start: Token) -> impl Iterator<Item = (&Token, &NodeId)> + '_ {
        self.vnodes.range(start..).chain(self.vnodes.range(..start))
    }

    /// Find the node that owns `key`.
    ///
    /// # Performance
    /// O(log V) where V = total vnodes.
    pub fn get_node(&self, key: &str) -> Result<NodeId> {
        let start = self.token_for_key(key);
        let (token, node_id) = self.walk_from(start).next().ok_or(Error::EmptyRing)?;
        trace!(key, key_token = %start, vnode_token = %token, %node_id, "resolved key");
        Ok(node_id.clone())
    }

    /// Find the ordered replica set for `key`.
    ///
    /// Walks clockwise from the key's position collecting distinct physical
    /// nodes. `replica_count` defaults to the ring's replication factor and is
    /// clamped to the number of nodes. The first entry always equals
    /// [`get_node`](Self::get_node).
    pub fn get_nodes_for_key(&self, key: &str, replica_count: Option<usize>) -> Result<Vec<NodeId>> {
        if self.vnodes.is_empty() {
            return Err(Error::EmptyRing);
        }

        let requested = replica_count.unwrap_or(self.replication_factor);
        let wanted = requested.min(self.nodes.len());
        if wanted < requested {
            debug!(
                requested,
                available = self.nodes.len(),
                "replica count exceeds node count, clamping"
            );
        }

        let mut replicas = Vec::with_capacity(wanted);
        if wanted == 0 {
            return Ok(replicas);
        }

        let mut seen = HashSet::with_capacity(wanted);
        for (_, node_id) in self.walk_from(self.token_for_key(key)) {
            if seen.insert(node_id) {
                replicas.push(node_id.clone());
                if replicas.len() == wanted {
                    break;
                }
            }
        }

        Ok(replicas)
    }

    /// Number of physical nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of vnode positions.
    pub fn token_count(&self) -> usize {
        self.vnodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id).map(|m| &m.node)
    }

    /// All physical nodes, sorted by id.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().map(|m| &m.node).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// All `(position, owner)` pairs in ascending position order.
    pub fn tokens(&self) -> Vec<(Token, NodeId)> {
        self.vnodes
            .iter()
            .map(|(token, node_id)| (*token, node_id.clone()))
            .collect()
    }

    /// All vnodes in ascending position order.
    pub fn vnodes(&self) -> impl Iterator<Item = VirtualNode> + '_ {
        self.vnodes
            .iter()
            .map(|(token, node_id)| VirtualNode::new(*token, node_id.clone()))
    }

    /// Positions owned by `node_id`, in placement order.
    pub fn tokens_for(&self, node_id: &str) -> Option<&[Token]> {
        self.nodes.get(node_id).map(|m| m.tokens.as_slice())
    }

    /// Base vnode count for a node of weight 1.
    pub fn vnode_count(&self) -> usize {
        self.vnode_count
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    pub fn partitioner(&self) -> &Arc<dyn Partitioner> {
        &self.partitioner
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::FnPartitioner;

    #[test]
    fn test_vnodes_for_weight_rounding() {
        let ring = HashRing::new();
        assert_eq!(ring.vnodes_for_weight(1.0), 100);
        assert_eq!(ring.vnodes_for_weight(0.5), 50);
        assert_eq!(ring.vnodes_for_weight(0.125), 13); // 12.5 rounds away from zero
        assert_eq!(ring.vnodes_for_weight(0.124), 12);
        assert_eq!(ring.vnodes_for_weight(0.001), 1); // never zero
        assert_eq!(ring.vnodes_for_weight(2.5), 250);
        assert_eq!(ring.vnodes_for_weight(1e20), HashRing::MAX_VNODES_PER_NODE);
    }

    #[test]
    fn test_oversized_weight_rejected_before_placement() {
        let mut ring = HashRing::new();
        for weight in [1e20, f64::MAX, 1e8] {
            assert!(matches!(
                ring.add_weighted_node("A", weight),
                Err(Error::InvalidWeight { .. })
            ));
        }
        assert!(ring.is_empty());
        assert_eq!(ring.token_count(), 0);

        let mut small = HashRing::builder().with_vnodes(4).build().unwrap();
        let at_limit = HashRing::MAX_VNODES_PER_NODE as f64 / 4.0;
        assert_eq!(small.checked_vnodes_for_weight(at_limit), Some(HashRing::MAX_VNODES_PER_NODE));
        assert_eq!(small.checked_vnodes_for_weight(at_limit + 1.0), None);
        assert!(matches!(
            small.add_weighted_node("B", at_limit + 1.0),
            Err(Error::InvalidWeight { .. })
        ));
        assert!(small.is_empty());
    }

    #[test]
    fn test_add_rejects_bad_input_without_mutation() {
        let mut ring = HashRing::new();
        ring.add_node("A").unwrap();

        assert_eq!(
            ring.add_node("A"),
            Err(Error::DuplicateNode(NodeId::from("A")))
        );
        assert!(matches!(ring.add_node(""), Err(Error::InvalidNode(_))));
        for weight in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ring.add_weighted_node("B", weight),
                Err(Error::InvalidWeight { .. })
            ));
        }

        assert_eq!(ring.node_count(), 1);
        assert_eq!(ring.token_count(), 100);
    }

    #[test]
    fn test_remove_unknown_node() {
        let mut ring = HashRing::new();
        assert_eq!(
            ring.remove_node("ghost"),
            Err(Error::NodeNotFound(NodeId::from("ghost")))
        );
    }

    #[test]
    fn test_lookup_wraps_past_last_position() {
        // A sits at 100, B at 200.
        let mut ring = HashRing::builder()
            .with_vnodes(1)
            .with_partitioner(FnPartitioner::new(|key: &[u8]| match key {
                b"A#0" => 100,
                b"B#0" => 200,
                b"low" => 50,
                b"mid" => 150,
                b"exact" => 200,
                _ => 250,
            }))
            .build()
            .unwrap();
        ring.add_node("A").unwrap();
        ring.add_node("B").unwrap();

        assert_eq!(ring.get_node("low").unwrap(), "A");
        assert_eq!(ring.get_node("mid").unwrap(), "B");
        assert_eq!(ring.get_node("exact").unwrap(), "B");
        assert_eq!(ring.get_node("high").unwrap(), "A"); // wraps

        let replicas = ring.get_nodes_for_key("high", None).unwrap();
        assert_eq!(replicas, vec![NodeId::from("A"), NodeId::from("B")]);
    }

    #[test]
    fn test_collision_is_probed_deterministically() {
        let hash = |key: &[u8]| match key {
            b"A#0" | b"B#0" => 7,
            b"B#0_1" => 7,
            b"B#0_2" => 9,
            _ => 1000,
        };
        let mut ring = HashRing::builder()
            .with_vnodes(1)
            .with_hash_fn(hash)
            .build()
            .unwrap();
        ring.add_node("A").unwrap();
        ring.add_node("B").unwrap();

        assert_eq!(ring.tokens_for("A").unwrap(), &[Token(7)]);
        assert_eq!(ring.tokens_for("B").unwrap(), &[Token(9)]);
        assert_eq!(ring.token_count(), 2);
    }

    #[test]
    fn test_collision_within_one_node() {
        // Every vnode of "A" initially lands on the same position.
        let mut ring = HashRing::builder()
            .with_vnodes(3)
            .with_hash_fn(|key: &[u8]| {
                let text = std::str::from_utf8(key).unwrap();
                match text.rsplit_once('_') {
                    Some((_, attempt)) => 1 + attempt.parse::<u64>().unwrap() * 10,
                    None => 1,
                }
            })
            .build()
            .unwrap();
        ring.add_node("A").unwrap();

        assert_eq!(ring.token_count(), 3);
        let mut tokens = ring.tokens_for("A").unwrap().to_vec();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_exhausted_probing_leaves_ring_unchanged() {
        let mut ring = HashRing::builder()
            .with_vnodes(2)
            .with_hash_fn(|_: &[u8]| 42)
            .build()
            .unwrap();

        let err = ring.add_node("A").unwrap_err();
        assert_eq!(
            err,
            Error::PositionsExhausted {
                node_id: NodeId::from("A"),
                replica_index: 1,
            }
        );
        assert!(ring.is_empty());
        assert_eq!(ring.token_count(), 0);
    }

    #[test]
    fn test_replica_count_zero_and_clamp() {
        let mut ring = HashRing::new();
        ring.add_node("A").unwrap();
        ring.add_node("B").unwrap();

        assert!(ring.get_nodes_for_key("k", Some(0)).unwrap().is_empty());
        assert_eq!(ring.get_nodes_for_key("k", Some(5)).unwrap().len(), 2);
        assert_eq!(ring.get_nodes_for_key("k", None).unwrap().len(), 2);
    }

    #[test]
    fn test_nodes_sorted_and_weighted() {
        let mut ring = HashRing::new();
        ring.add_weighted_node("b", 0.5).unwrap();
        ring.add_node("a").unwrap();

        let nodes = ring.nodes();
        assert_eq!(nodes[0].id, "a");
        assert_eq!(nodes[0].vnodes, 100);
        assert_eq!(nodes[1].id, "b");
        assert_eq!(nodes[1].vnodes, 50);
        assert_eq!(nodes[1].weight, 0.5);
        assert_eq!(ring.token_count(), 150);
    }
}
