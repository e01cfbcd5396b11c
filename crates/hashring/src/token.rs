//! Ring positions.
//!
//! The ring is the integers modulo 2^64. A [`Token`] is one position on it,
//! either a vnode's placement or the hash of a looked-up key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Size of the ring's position space as a float, used for ownership shares.
pub const RING_SPACE: f64 = 18_446_744_073_709_551_616.0; // 2^64

/// A position on the 64-bit hash ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub u64);

impl Token {
    /// Minimum token value (start of ring).
    pub const MIN: Token = Token(0);
    /// Maximum token value (end of ring).
    pub const MAX: Token = Token(u64::MAX);

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Clockwise distance from `self` to `other`, wrapping past the maximum.
    ///
    /// The distance from a token to itself is zero.
    #[inline]
    pub fn distance_to(self, other: Token) -> u64 {
        other.0.wrapping_sub(self.0)
    }
}

impl From<u64> for Token {
    fn from(value: u64) -> Self {
        Token(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
