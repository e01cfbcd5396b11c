//! SipHash partitioner implementation.

use std::hash::Hasher;

use siphasher::sip::SipHasher13;

use crate::partitioner::traits::Partitioner;
use crate::token::Token;

/// SipHash-1-3 with fixed zero keys, so tokens are stable across processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipPartitioner;

impl Partitioner for SipPartitioner {
    fn partition(&self, key: &[u8]) -> Token {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        Token(hasher.finish())
    }

    fn name(&self) -> &'static str {
        "SipPartitioner"
    }
}
