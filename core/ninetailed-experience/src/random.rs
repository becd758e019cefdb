//! Stable pseudo-random values derived from a profile's stable id.
//!
//! The value for a given `(purpose, experience, stableId)` never changes,
//! which is what makes bucketing sticky without persisting the bucket.
//! Traffic gating and bucket choice use different purposes so that the two
//! draws are not correlated.

use std::fmt;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// Upper bound of the 32-bit hash space used for normalization.
const HASH_SPACE: f64 = 4_294_967_295.0;

/// Why a random value is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Gates whether the profile takes part in the experience at all.
    Traffic,
    /// Picks the distribution bucket.
    Distribution,
}

impl Purpose {
    /// The prefix mixed into the hash input.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Traffic => "traffic",
            Self::Distribution => "distribution",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MurmurHash3 x86 32-bit.
#[must_use]
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h = seed;

    let mut blocks = data.chunks_exact(4);
    for block in &mut blocks {
        let mut k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k = k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h ^= k;
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k ^= u32::from(*byte) << (8 * i);
        }
        h ^= k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
    }

    // Length is mixed in modulo 2^32, as in the reference implementation.
    h ^= data.len() as u32;
    fmix32(h)
}

fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}

/// Returns the stable random value for `(purpose, experience_id, stable_id)`.
///
/// Hashes `"{purpose}-{experience_id}-{stable_id}"` and normalizes by the
/// size of the hash space, giving a value in `[0, 1]`.
#[must_use]
pub fn random_for(purpose: Purpose, experience_id: &str, stable_id: &str) -> f64 {
    let input = format!("{purpose}-{experience_id}-{stable_id}");
    let hash = murmur3_32(input.as_bytes(), 0);
    f64::from(hash) / HASH_SPACE
}
