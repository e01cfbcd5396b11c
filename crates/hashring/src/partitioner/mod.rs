//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting keys into tokens
//! that can be placed on the hash ring.

pub mod blake;
pub mod function;
pub mod sha256;
pub mod sip;
pub mod traits;
pub mod xxhash;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use blake::Blake3Partitioner;
pub use function::FnPartitioner;
pub use sha256::Sha256Partitioner;
pub use sip::SipPartitioner;
pub use traits::Partitioner;
pub use xxhash::Xxh3Partitioner;

/// Built-in hash functions, selectable by name from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
    #[serde(alias = "sip")]
    Siphash,
    Xxh3,
}

impl HashAlgorithm {
    /// Every built-in algorithm, in display order.
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Blake3,
        HashAlgorithm::Siphash,
        HashAlgorithm::Xxh3,
    ];

    /// Instantiate the partitioner for this algorithm.
    pub fn partitioner(self) -> Arc<dyn Partitioner> {
        match self {
            HashAlgorithm::Sha256 => Arc::new(Sha256Partitioner),
            HashAlgorithm::Blake3 => Arc::new(Blake3Partitioner),
            HashAlgorithm::Siphash => Arc::new(SipPartitioner),
            HashAlgorithm::Xxh3 => Arc::new(Xxh3Partitioner),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Siphash => "siphash",
            HashAlgorithm::Xxh3 => "xxh3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            "siphash" | "sip" => Ok(HashAlgorithm::Siphash),
            "xxh3" | "xxhash" => Ok(HashAlgorithm::Xxh3),
            other => Err(Error::InvalidConfig(format!(
                "unknown hash algorithm '{other}' (expected one of: sha256, blake3, siphash, xxh3)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("XXH3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Xxh3);
        assert_eq!("sip".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Siphash);
        assert!(matches!(
            "md5".parse::<HashAlgorithm>(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for algo in HashAlgorithm::ALL {
            assert_eq!(algo.to_string().parse::<HashAlgorithm>().unwrap(), algo);
        }
    }

    #[test]
    fn test_partitioners_are_deterministic_and_distinct() {
        let tokens: Vec<_> = HashAlgorithm::ALL
            .iter()
            .map(|algo| {
                let p = algo.partitioner();
                let a = p.partition(b"user:1");
                assert_eq!(a, p.partition(b"user:1"), "{} not deterministic", p.name());
                assert_ne!(a, p.partition(b"user:2"));
                a
            })
            .collect();

        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), tokens.len());
    }

    #[test]
    fn test_serde_lowercase_names() {
        let algo: HashAlgorithm = serde_json::from_str("\"blake3\"").unwrap();
        assert_eq!(algo, HashAlgorithm::Blake3);
        assert_eq!(serde_json::to_string(&HashAlgorithm::Siphash).unwrap(), "\"siphash\"");
    }
}
