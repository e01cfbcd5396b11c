//! Ring topology views.
//!
//! Read-only analysis over a ring snapshot: how much of the hash space each
//! node owns, how a key sample is distributed, and which keys change owner
//! between two snapshots.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::node::NodeId;
use crate::ring::HashRing;
use crate::token::RING_SPACE;

/// Share of the ring owned by one physical node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ownership {
    pub node_id: NodeId,
    pub weight: f64,
    pub vnodes: usize,
    /// Fraction of the 2^64 position space whose keys resolve to this node.
    pub share: f64,
    /// This node's weight divided by the total weight.
    pub weight_share: f64,
}

/// Per-node ownership of a ring, sorted by node id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    pub nodes: Vec<Ownership>,
    pub total_vnodes: usize,
}

impl Topology {
    /// Compute ownership for every node.
    ///
    /// A vnode at position `p` owns the arc `(prev, p]` where `prev` is the
    /// preceding position, wrapping around. With a single vnode the arc is the
    /// whole ring.
    pub fn of(ring: &HashRing) -> Self {
        let mut arcs: BTreeMap<NodeId, u128> = BTreeMap::new();
        let tokens = ring.tokens();

        if let Some((last, _)) = tokens.last() {
            let mut prev = *last;
            for (token, node_id) in &tokens {
                let arc = match prev.distance_to(*token) {
                    0 => 1u128 << 64,
                    d => u128::from(d),
                };
                *arcs.entry(node_id.clone()).or_default() += arc;
                prev = *token;
            }
        }

        let total_weight: f64 = ring.nodes().iter().map(|n| n.weight).sum();
        let nodes = ring
            .nodes()
            .into_iter()
            .map(|node| Ownership {
                node_id: node.id.clone(),
                weight: node.weight,
                vnodes: node.vnodes,
                share: arcs.get(&node.id).copied().unwrap_or(0) as f64 / RING_SPACE,
                weight_share: node.weight / total_weight,
            })
            .collect();

        Self {
            nodes,
            total_vnodes: ring.token_count(),
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&Ownership> {
        self.nodes.iter().find(|o| o.node_id == *node_id)
    }

    /// Keys whose primary owner differs between `before` and `after`.
    pub fn movement<I, K>(before: &HashRing, after: &HashRing, keys: I) -> Result<Vec<Migration>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut migrations = Vec::new();
        for key in keys {
            let key = key.as_ref();
            let from = before.get_node(key)?;
            let to = after.get_node(key)?;
            if from != to {
                migrations.push(Migration {
                    key: key.to_string(),
                    from,
                    to,
                });
            }
        }
        Ok(migrations)
    }
}

/// A key whose owner changed between two ring snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Migration {
    pub key: String,
    pub from: NodeId,
    pub to: NodeId,
}

/// Number of keys per node for a key sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyDistribution {
    /// Keys owned per node; nodes that own none are listed with zero.
    pub counts: BTreeMap<NodeId, usize>,
    pub total: usize,
}

impl KeyDistribution {
    pub fn measure<I, K>(ring: &HashRing, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut counts: BTreeMap<NodeId, usize> =
            ring.nodes().iter().map(|n| (n.id.clone(), 0)).collect();
        let mut total = 0;
        for key in keys {
            *counts.entry(ring.get_node(key.as_ref())?).or_default() += 1;
            total += 1;
        }
        Ok(Self { counts, total })
    }

    pub fn count(&self, node_id: &str) -> usize {
        self.counts.get(node_id).copied().unwrap_or(0)
    }

    /// Fraction of the sample owned by `node_id`.
    pub fn fraction(&self, node_id: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(node_id) as f64 / self.total as f64
    }

    pub fn mean(&self) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        self.total as f64 / self.counts.len() as f64
    }

    /// Sample standard deviation of the per-node counts.
    pub fn std_dev(&self) -> f64 {
        let n = self.counts.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .counts
            .values()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        variance.sqrt()
    }

    pub fn min(&self) -> usize {
        self.counts.values().copied().min().unwrap_or(0)
    }

    pub fn max(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }
}
