//! Subcommands and their results.

use std::fmt;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use hashring::{NodeId, RingConfig, Topology};
use serde::Serialize;

use crate::simulation::{run_simulation, SimulationParams, SimulationReport};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the owner and replica set of each key.
    Lookup {
        /// Keys to place.
        #[arg(required = true)]
        keys: Vec<String>,

        /// Replica set size (defaults to the replication factor).
        #[arg(long)]
        replicas: Option<usize>,
    },

    /// Show per-node vnode counts and ownership of the hash space.
    Inspect,

    /// Measure key distribution and movement when a node joins and leaves.
    Simulate {
        /// Number of initial nodes (named node-0 .. node-N-1).
        #[arg(long = "nodes", default_value_t = 10)]
        node_count: usize,

        /// Number of keys (named key-0 .. key-M-1).
        #[arg(long = "keys", default_value_t = 100_000)]
        key_count: usize,
    },
}

impl Command {
    pub fn execute(&self, config: &RingConfig) -> Result<CommandResult> {
        match self {
            Command::Lookup { keys, replicas } => {
                let ring = config.build().context("building ring")?;
                if ring.is_empty() {
                    bail!("no nodes configured; pass --node or a --config file with nodes");
                }
                let placements = keys
                    .iter()
                    .map(|key| -> hashring::Result<KeyPlacement> {
                        Ok(KeyPlacement {
                            key: key.clone(),
                            token: ring.token_for_key(key).to_string(),
                            owner: ring.get_node(key)?,
                            replicas: ring.get_nodes_for_key(key, *replicas)?,
                        })
                    })
                    .collect::<hashring::Result<Vec<_>>>()?;
                Ok(CommandResult::Lookup(placements))
            }
            Command::Inspect => {
                let ring = config.build().context("building ring")?;
                Ok(CommandResult::Inspect(Topology::of(&ring)))
            }
            Command::Simulate {
                node_count,
                key_count,
            } => {
                if !config.nodes.is_empty() {
                    tracing::warn!("simulate generates its own nodes; configured nodes are ignored");
                }
                let params = SimulationParams {
                    node_count: *node_count,
                    key_count: *key_count,
                    vnode_count: config.vnode_count,
                    replication_factor: config.replication_factor,
                    hash: config.hash,
                };
                Ok(CommandResult::Simulate(run_simulation(&params)?))
            }
        }
    }
}

/// Where one key lands.
#[derive(Debug, Clone, Serialize)]
pub struct KeyPlacement {
    pub key: String,
    /// Key position as fixed-width hex.
    pub token: String,
    pub owner: NodeId,
    pub replicas: Vec<NodeId>,
}

/// Output of a command, printable as text or JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CommandResult {
    Lookup(Vec<KeyPlacement>),
    Inspect(Topology),
    Simulate(SimulationReport),
}

impl CommandResult {
    /// Fail if the result records a violated ring property.
    pub fn check(&self) -> Result<()> {
        if let CommandResult::Simulate(report) = self {
            let violations = report.violations();
            if !violations.is_empty() {
                bail!("simulation failed: {}", violations.join("; "));
            }
        }
        Ok(())
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Lookup(placements) => {
                for p in placements {
                    let replicas: Vec<&str> = p.replicas.iter().map(NodeId::as_str).collect();
                    writeln!(
                        f,
                        "{}  token={}  owner={}  replicas=[{}]",
                        p.key,
                        p.token,
                        p.owner,
                        replicas.join(", ")
                    )?;
                }
                Ok(())
            }
            CommandResult::Inspect(topology) => {
                writeln!(
                    f,
                    "{:<24} {:>8} {:>8} {:>9} {:>13}",
                    "NODE", "WEIGHT", "VNODES", "SHARE", "WEIGHT SHARE"
                )?;
                for o in &topology.nodes {
                    writeln!(
                        f,
                        "{:<24} {:>8.2} {:>8} {:>8.2}% {:>12.2}%",
                        o.node_id.as_str(),
                        o.weight,
                        o.vnodes,
                        o.share * 100.0,
                        o.weight_share * 100.0
                    )?;
                }
                writeln!(f, "total vnodes: {}", topology.total_vnodes)
            }
            CommandResult::Simulate(report) => write!(f, "{report}"),
        }
    }
}
