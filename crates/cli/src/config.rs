//! Command-line configuration.
//!
//! Ring settings come from an optional JSON file (`--config`) and are then
//! overridden by flags. Nodes given with `--node` are appended to the file's
//! node list.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use hashring::partitioner::HashAlgorithm;
use hashring::{NodeConfig, NodeId, RingConfig};
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(
    name = "ringctl",
    version,
    about = "Inspect and simulate weighted consistent hash rings"
)]
pub struct CliConfig {
    /// Path to a JSON ring config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Vnodes per unit of weight (default 100).
    #[arg(long, global = true)]
    pub vnodes: Option<usize>,

    /// Default replica set size (default 3).
    #[arg(short, long, global = true)]
    pub replication_factor: Option<usize>,

    /// Hash function: sha256, blake3, siphash or xxh3 (default sha256).
    #[arg(long, global = true)]
    pub hash: Option<HashAlgorithm>,

    /// Node to add, optionally weighted. Repeatable.
    #[arg(short, long = "node", value_name = "ID[=WEIGHT]", global = true)]
    pub nodes: Vec<NodeSpec>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> Result<()> {
        init_tracing(&self.log_level);

        let ring_config = self.ring_config()?;
        let result = self.command.execute(&ring_config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print!("{result}");
        }
        result.check()
    }

    /// Merge the config file (if any) with command-line overrides.
    pub fn ring_config(&self) -> Result<RingConfig> {
        let mut config = match &self.config {
            Some(path) => RingConfig::from_path(path)
                .with_context(|| format!("loading ring config from {}", path.display()))?,
            None => RingConfig::default(),
        };

        if let Some(vnodes) = self.vnodes {
            config.vnode_count = vnodes;
        }
        if let Some(replication_factor) = self.replication_factor {
            config.replication_factor = replication_factor;
        }
        if let Some(hash) = self.hash {
            config.hash = hash;
        }
        config
            .nodes
            .extend(self.nodes.iter().map(|spec| NodeConfig {
                id: spec.id.clone(),
                weight: spec.weight,
            }));

        Ok(config)
    }
}

/// A `--node` argument: `ID` or `ID=WEIGHT`. The weight is taken from after
/// the last `=`, so ids may themselves contain `=`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: NodeId,
    pub weight: f64,
}

impl FromStr for NodeSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (id, weight) = match s.rsplit_once('=') {
            Some((id, weight)) => {
                let weight = weight
                    .parse::<f64>()
                    .map_err(|e| format!("invalid weight '{weight}': {e}"))?;
                (id, weight)
            }
            None => (s, hashring::Node::DEFAULT_WEIGHT),
        };
        if id.is_empty() {
            return Err("node id must not be empty".to_string());
        }
        Ok(NodeSpec {
            id: NodeId::from(id),
            weight,
        })
    }
}

/// Install the global tracing subscriber. Logs go to stderr so `--json`
/// output stays parseable.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
