//! Core partitioner trait definitions.

use std::fmt::Debug;

use crate::token::Token;

/// A partitioner converts keys into tokens for placement on the hash ring.
///
/// The same partitioner hashes both vnode keys and lookup keys, so it is
/// fixed when the ring is built and never swapped afterwards. Implementations
/// must be deterministic: equal input always yields the same token.
pub trait Partitioner: Send + Sync + Debug + 'static {
    /// Converts a key into a token.
    fn partition(&self, key: &[u8]) -> Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}
