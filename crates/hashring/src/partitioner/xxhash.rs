//! XXH3 partitioner implementation.

use xxhash_rust::xxh3::xxh3_64;

use crate::partitioner::traits::Partitioner;
use crate::token::Token;

/// Non-cryptographic XXH3-64. Fastest option; not collision resistant
/// against adversarial keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Partitioner;

impl Partitioner for Xxh3Partitioner {
    fn partition(&self, key: &[u8]) -> Token {
        Token(xxh3_64(key))
    }

    fn name(&self) -> &'static str {
        "Xxh3Partitioner"
    }
}
