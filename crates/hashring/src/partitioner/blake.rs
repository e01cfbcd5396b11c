//! BLAKE3 partitioner implementation.

use crate::partitioner::traits::Partitioner;
use crate::token::Token;

/// BLAKE3 hash truncated to u64 (first 8 bytes, little-endian).
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Partitioner;

impl Partitioner for Blake3Partitioner {
    fn partition(&self, key: &[u8]) -> Token {
        let hash = blake3::hash(key);
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        Token(u64::from_le_bytes(prefix))
    }

    fn name(&self) -> &'static str {
        "Blake3Partitioner"
    }
}
