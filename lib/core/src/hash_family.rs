//! Seeded family of affine hash functions `h(x) = (a·x + b) mod p`.
//!
//! The generator is `Xoshiro256PlusPlus`, whose output stream is fixed for a
//! given seed across platforms and releases, so a `(num_hashes, seed)` pair
//! always yields the same functions.

use crate::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;

/// Mersenne prime 2^61 - 1, larger than any 32-bit shingle.
pub const MODULUS: u64 = (1 << 61) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HashFunction {
    a: u64,
    b: u64,
}

impl HashFunction {
    /// `a` must lie in `[1, p-1]` and `b` in `[0, p-1]`.
    pub fn new(a: u64, b: u64) -> Result<Self> {
        if a == 0 || a >= MODULUS || b >= MODULUS {
            return Err(Error::InvalidConfig(format!(
                "hash coefficients out of range: a={a}, b={b}"
            )));
        }
        Ok(Self { a, b })
    }

    #[inline]
    pub fn a(&self) -> u64 {
        self.a
    }

    #[inline]
    pub fn b(&self) -> u64 {
        self.b
    }

    #[inline]
    #[must_use]
    pub fn apply(&self, x: u32) -> u64 {
        let v = (self.a as u128 * x as u128 + self.b as u128) % MODULUS as u128;
        v as u64
    }
}

/// The ordered list of hash functions behind one signature matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashFamily {
    seed: u64,
    functions: Vec<HashFunction>,
}

impl HashFamily {
    pub fn generate(num_hashes: usize, seed: u64) -> Result<Self> {
        if num_hashes == 0 {
            return Err(Error::InvalidConfig(
                "num_hashes must be greater than zero".to_string(),
            ));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let functions = (0..num_hashes)
            .map(|_| {
                let a = rng.random_range(1..MODULUS);
                let b = rng.random_range(0..MODULUS);
                HashFunction { a, b }
            })
            .collect();

        Ok(Self { seed, functions })
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    #[inline]
    pub fn functions(&self) -> &[HashFunction] {
        &self.functions
    }

    pub fn iter(&self) -> impl Iterator<Item = &HashFunction> {
        self.functions.iter()
    }
}
