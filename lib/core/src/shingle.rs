//! Character k-gram shingling.
//!
//! Shingles are hashed with xxHash32 (seed 0) over their UTF-8 bytes. The
//! hash is part of the index contract: the same text must produce the same
//! shingle values in every process, on every platform, in every release.

use crate::{Error, Result};
use serde::Serialize;
use xxhash_rust::xxh32::xxh32;

/// Identifies the shingle hash in use. Bump if `shingle_hash` ever changes.
pub const SHINGLE_HASH: &str = "xxh32-seed0-utf8/v1";

/// Stable 32-bit hash of a shingle.
#[inline]
#[must_use]
pub fn shingle_hash(s: &str) -> u32 {
    xxh32(s.as_bytes(), 0)
}

/// Set of shingle hashes for one item, kept sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ShingleSet {
    hashes: Vec<u32>,
}

impl ShingleSet {
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_hashes(mut hashes: Vec<u32>) -> Self {
        hashes.sort_unstable();
        hashes.dedup();
        Self { hashes }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.hashes.iter().copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.hashes
    }

    #[inline]
    pub fn contains(&self, hash: u32) -> bool {
        self.hashes.binary_search(&hash).is_ok()
    }

    /// Size of the intersection, by merging the two sorted lists.
    pub fn intersection_len(&self, other: &ShingleSet) -> usize {
        let (a, b) = (&self.hashes, &other.hashes);
        let (mut i, mut j, mut common) = (0, 0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    common += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        common
    }

    /// Exact Jaccard similarity `|A ∩ B| / |A ∪ B|`; 0.0 if either set is empty.
    pub fn jaccard(&self, other: &ShingleSet) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let common = self.intersection_len(other);
        let union = self.len() + other.len() - common;
        common as f64 / union as f64
    }
}

/// Splits text into hashed character shingles of a fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shingler {
    k: usize,
}

impl Shingler {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig(
                "k_shingle must be greater than zero".to_string(),
            ));
        }
        Ok(Self { k })
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Shingle `text`. Empty text gives an empty set; text shorter than `k`
    /// characters gives a single hash of the whole text.
    pub fn shingle(&self, text: &str) -> ShingleSet {
        if text.is_empty() {
            return ShingleSet::empty();
        }

        // Byte offset of every char boundary, including the end of the string.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let num_chars = bounds.len() - 1;

        if num_chars < self.k {
            return ShingleSet {
                hashes: vec![shingle_hash(text)],
            };
        }

        let hashes = (0..=num_chars - self.k)
            .map(|start| shingle_hash(&text[bounds[start]..bounds[start + self.k]]))
            .collect();
        ShingleSet::from_hashes(hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_k_rejected() {
        assert!(matches!(Shingler::new(0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_text() {
        let shingler = Shingler::new(3).unwrap();
        assert!(shingler.shingle("").is_empty());
    }

    #[test]
    fn test_short_text_sentinel() {
        let shingler = Shingler::new(5).unwrap();
        let set = shingler.shingle("abc");
        assert_eq!(set.len(), 1);
        assert!(set.contains(shingle_hash("abc")));
    }

    #[test]
    fn test_window_count() {
        let shingler = Shingler::new(3).unwrap();
        // "abc", "bcd", "cde", "def"
        assert_eq!(shingler.shingle("abcdef").len(), 4);
        // repeated windows collapse
        assert_eq!(shingler.shingle("aaaaaa").len(), 1);
        // exactly k chars is one window, not the fallback
        let set = shingler.shingle("abc");
        assert_eq!(set.as_slice(), &[shingle_hash("abc")]);
    }

    #[test]
    fn test_multibyte_chars() {
        let shingler = Shingler::new(2).unwrap();
        let set = shingler.shingle("héé");
        assert!(set.contains(shingle_hash("hé")));
        assert!(set.contains(shingle_hash("éé")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_hash_is_stable() {
        // Known xxh32 vectors; these must never change between builds.
        assert_eq!(shingle_hash(""), 0x02CC5D05);
        assert_eq!(shingle_hash("a"), 0x550D7456);
        assert_eq!(shingle_hash("abc"), 0x32D153FF);
    }

    #[test]
    fn test_jaccard() {
        let a = ShingleSet::from_hashes(vec![1, 2, 3, 4]);
        let b = ShingleSet::from_hashes(vec![3, 4, 5, 6]);
        assert_eq!(a.intersection_len(&b), 2);
        assert!((a.jaccard(&b) - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(a.jaccard(&a), 1.0);
        assert_eq!(a.jaccard(&ShingleSet::empty()), 0.0);
        assert_eq!(ShingleSet::empty().jaccard(&ShingleSet::empty()), 0.0);
    }
}
