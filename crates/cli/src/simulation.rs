//! Distribution and movement simulation.
//!
//! Builds a ring of `node-0 .. node-{N-1}` and places keys `key-0 .. key-{M-1}`:
//!
//! 1. Measure how evenly the keys spread over the nodes.
//! 2. Add `node-N`; every key that moves must move to it.
//! 3. Remove `node-N`; only its keys may move, and every key must return to
//!    its original owner.
//! 4. Every replica set must hold `min(R, N)` distinct nodes.

use std::fmt;

use anyhow::{Context, Result};
use hashring::partitioner::HashAlgorithm;
use hashring::{KeyDistribution, NodeId, RingBuilder};
use serde::Serialize;
use tracing::info;

/// Inputs to [`run_simulation`].
#[derive(Debug, Clone, Serialize)]
pub struct SimulationParams {
    pub node_count: usize,
    pub key_count: usize,
    pub vnode_count: usize,
    pub replication_factor: usize,
    pub hash: HashAlgorithm,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub params: SimulationParams,
    pub distribution: KeyDistribution,
    pub mean: f64,
    pub std_dev: f64,
    pub min: usize,
    pub max: usize,
    pub join: JoinReport,
    pub leave: LeaveReport,
    /// Keys whose replica set was short or held a duplicate.
    pub replica_errors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinReport {
    pub node: NodeId,
    pub moved: usize,
    pub fraction: f64,
    /// `1 / (N + 1)`.
    pub expected_fraction: f64,
    /// Keys that moved to a node other than the joining one.
    pub misrouted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveReport {
    pub node: NodeId,
    pub moved: usize,
    /// Keys that moved although they were not on the leaving node.
    pub moved_from_survivors: usize,
    /// Keys that did not return to their pre-join owner.
    pub consistency_errors: usize,
}

impl SimulationReport {
    /// Human-readable descriptions of every violated property.
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.join.misrouted > 0 {
            violations.push(format!(
                "{} keys moved to an existing node on join",
                self.join.misrouted
            ));
        }
        if self.leave.moved_from_survivors > 0 {
            violations.push(format!(
                "{} keys moved off a surviving node on leave",
                self.leave.moved_from_survivors
            ));
        }
        if self.leave.consistency_errors > 0 {
            violations.push(format!(
                "{} keys did not return to their original node",
                self.leave.consistency_errors
            ));
        }
        if self.join.moved != self.leave.moved {
            violations.push(format!(
                "moved on join ({}) != moved on leave ({})",
                self.join.moved, self.leave.moved
            ));
        }
        if self.replica_errors > 0 {
            violations.push(format!("{} malformed replica sets", self.replica_errors));
        }
        violations
    }
}

pub fn run_simulation(params: &SimulationParams) -> Result<SimulationReport> {
    anyhow::ensure!(params.node_count > 0, "simulation needs at least one node");

    let keys: Vec<String> = (0..params.key_count).map(|i| format!("key-{i}")).collect();
    let mut ring = (0..params.node_count)
        .fold(
            RingBuilder::new()
                .with_vnodes(params.vnode_count)
                .with_replication_factor(params.replication_factor)
                .with_hash_algorithm(params.hash),
            |builder, i| builder.add_node(format!("node-{i}")),
        )
        .build()
        .context("building simulation ring")?;
    info!(nodes = params.node_count, vnodes = ring.token_count(), "simulation ring ready");

    // Initial distribution
    let distribution = KeyDistribution::measure(&ring, &keys)?;

    let wanted = params.replication_factor.min(params.node_count);
    let mut replica_errors = 0;
    for key in &keys {
        let replicas = ring.get_nodes_for_key(key, None)?;
        let mut unique = replicas.clone();
        unique.sort();
        unique.dedup();
        if replicas.len() != wanted || unique.len() != wanted {
            replica_errors += 1;
        }
    }

    let initial: Vec<NodeId> = keys
        .iter()
        .map(|k| ring.get_node(k))
        .collect::<hashring::Result<_>>()?;

    // Join
    let joining = NodeId::from(format!("node-{}", params.node_count));
    ring.add_node(joining.clone())?;
    let mut intermediate = Vec::with_capacity(keys.len());
    let mut join_moved = 0;
    let mut misrouted = 0;
    for (key, before) in keys.iter().zip(&initial) {
        let now = ring.get_node(key)?;
        if now != *before {
            join_moved += 1;
            if now != joining {
                misrouted += 1;
            }
        }
        intermediate.push(now);
    }
    info!(node = %joining, moved = join_moved, "node joined");

    // Leave
    ring.remove_node(joining.as_str())?;
    let mut leave_moved = 0;
    let mut moved_from_survivors = 0;
    let mut consistency_errors = 0;
    for ((key, before), mid) in keys.iter().zip(&initial).zip(&intermediate) {
        let now = ring.get_node(key)?;
        if now != *mid {
            leave_moved += 1;
            if *mid != joining {
                moved_from_survivors += 1;
            }
        }
        if now != *before {
            consistency_errors += 1;
        }
    }
    info!(node = %joining, moved = leave_moved, "node left");

    let fraction = if keys.is_empty() {
        0.0
    } else {
        join_moved as f64 / keys.len() as f64
    };

    Ok(SimulationReport {
        params: params.clone(),
        mean: distribution.mean(),
        std_dev: distribution.std_dev(),
        min: distribution.min(),
        max: distribution.max(),
        distribution,
        join: JoinReport {
            node: joining.clone(),
            moved: join_moved,
            fraction,
            expected_fraction: 1.0 / (params.node_count + 1) as f64,
            misrouted,
        },
        leave: LeaveReport {
            node: joining,
            moved: leave_moved,
            moved_from_survivors,
            consistency_errors,
        },
        replica_errors,
    })
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.params;
        writeln!(f, "--- Consistent Hashing Simulation ---")?;
        writeln!(f, "Initial nodes:   {}", p.node_count)?;
        writeln!(f, "Keys:            {}", p.key_count)?;
        writeln!(f, "VNodes per node: {}", p.vnode_count)?;
        writeln!(f, "Replication:     {}", p.replication_factor)?;
        writeln!(f, "Hash:            {}", p.hash)?;

        writeln!(f, "\nKey distribution per node:")?;
        let total = self.distribution.total.max(1) as f64;
        for (node, count) in &self.distribution.counts {
            writeln!(
                f,
                "  {node}: {count} keys ({:.2}%)",
                *count as f64 / total * 100.0
            )?;
        }
        let relative = if self.mean > 0.0 {
            self.std_dev / self.mean * 100.0
        } else {
            0.0
        };
        writeln!(f, "  Mean:   {:.2} keys per node", self.mean)?;
        writeln!(f, "  StdDev: {:.2} ({relative:.2}% of mean)", self.std_dev)?;
        writeln!(f, "  Min:    {} keys", self.min)?;
        writeln!(f, "  Max:    {} keys", self.max)?;

        writeln!(f, "\nJoin of '{}':", self.join.node)?;
        writeln!(
            f,
            "  Keys remapped: {} / {} ({:.4})",
            self.join.moved, p.key_count, self.join.fraction
        )?;
        writeln!(f, "  Expected:      ~{:.4}", self.join.expected_fraction)?;

        writeln!(f, "\nLeave of '{}':", self.leave.node)?;
        writeln!(f, "  Keys remapped: {} / {}", self.leave.moved, p.key_count)?;
        writeln!(f, "  Consistency errors: {}", self.leave.consistency_errors)?;
        writeln!(f, "  Replica set errors: {}", self.replica_errors)?;

        let violations = self.violations();
        if violations.is_empty() {
            writeln!(f, "\nRing is consistent.")
        } else {
            writeln!(f, "\nViolations:")?;
            for v in violations {
                writeln!(f, "  - {v}")?;
            }
            Ok(())
        }
    }
}
