//! SHA-256 partitioner implementation.

use sha2::{Digest, Sha256};

use crate::partitioner::traits::Partitioner;
use crate::token::Token;

/// SHA-256 digest truncated to its first 8 bytes, read big-endian.
///
/// This is the ring's default hash function.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Partitioner;

impl Partitioner for Sha256Partitioner {
    fn partition(&self, key: &[u8]) -> Token {
        let digest = Sha256::digest(key);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Token(u64::from_be_bytes(prefix))
    }

    fn name(&self) -> &'static str {
        "Sha256Partitioner"
    }
}
