//! # lshfind Core
//!
//! Near-duplicate retrieval for short text documents with MinHash and
//! banded Locality-Sensitive Hashing.
//!
//! - [`Shingler`] - character k-grams hashed with a stable 32-bit hash
//! - [`HashFamily`] - seeded affine hash functions over a prime field
//! - [`SignatureBuilder`] - MinHash signature matrix construction
//! - [`BucketTable`] - band-keyed LSH buckets
//! - [`LshIndex`] - fit once, then query by exact Jaccard over candidates
//! - [`IndexRegistry`] - one index per method (text field variant)
//!
//! ## Example
//!
//! ```rust
//! use lshfind_core::{Document, IndexParams, LshIndex};
//!
//! let docs = vec![
//!     Document::from_fields("a", [("title", "a quick brown fox")]),
//!     Document::from_fields("b", [("title", "a quick brown fox jumps")]),
//!     Document::from_fields("c", [("title", "totally unrelated text")]),
//! ];
//!
//! let mut index = LshIndex::new(IndexParams {
//!     num_hashes: 30,
//!     bands: 30,
//!     k_shingle: 3,
//!     seed: 42,
//! })
//! .unwrap();
//! index.fit(&docs, "title").unwrap();
//!
//! let results = index.find_similar("a", 10).unwrap();
//! assert_eq!(results[0].id, "b");
//! ```

pub mod bands;
pub mod document;
pub mod error;
pub mod hash_family;
pub mod index;
pub mod registry;
pub mod shingle;
pub mod signature;

pub use bands::{BandKey, BandLayout, BucketTable};
pub use document::Document;
pub use error::{Error, Result};
pub use hash_family::{HashFamily, HashFunction, MODULUS};
pub use index::{build_index, IndexParams, IndexStats, LshIndex, SimilarItem};
pub use registry::{IndexRegistry, MethodSpec};
pub use shingle::{shingle_hash, ShingleSet, Shingler, SHINGLE_HASH};
pub use signature::{SignatureBuilder, SignatureMatrix};
