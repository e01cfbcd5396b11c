//! Partitioner backed by a caller-supplied hash function.

use std::fmt;

use crate::partitioner::traits::Partitioner;
use crate::token::Token;

/// Wraps any `Fn(&[u8]) -> u64` as a partitioner.
///
/// # Example
///
/// ```rust
/// use hashring::partitioner::FnPartitioner;
/// use hashring::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .with_partitioner(FnPartitioner::new(|key: &[u8]| key.len() as u64))
///     .build()
///     .unwrap();
/// assert_eq!(ring.partitioner_name(), "FnPartitioner");
/// ```
pub struct FnPartitioner<F> {
    hash: F,
}

impl<F> FnPartitioner<F>
where
    F: Fn(&[u8]) -> u64 + Send + Sync + 'static,
{
    pub fn new(hash: F) -> Self {
        Self { hash }
    }
}

impl<F> Partitioner for FnPartitioner<F>
where
    F: Fn(&[u8]) -> u64 + Send + Sync + 'static,
{
    fn partition(&self, key: &[u8]) -> Token {
        Token((self.hash)(key))
    }

    fn name(&self) -> &'static str {
        "FnPartitioner"
    }
}

impl<F> fmt::Debug for FnPartitioner<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPartitioner").finish_non_exhaustive()
    }
}
