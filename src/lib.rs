//! # lshfind
//!
//! Similar-product lookup over a text catalog without comparing every pair.
//!
//! Each product's text is cut into character shingles, summarized by a
//! MinHash signature, and bucketed by banded Locality-Sensitive Hashing.
//! A query unions the buckets of one product, scores those candidates by
//! exact Jaccard similarity, and returns the best matches.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! lshfind --data-file data/meta_Appliances.json --http-port 5000
//! curl -X POST localhost:5000/api/similar \
//!      -H 'content-type: application/json' \
//!      -d '{"mode": "by_id", "product_id": "B00002N5EL", "method": "title", "k": 5}'
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use lshfind::prelude::*;
//!
//! let docs = vec![
//!     Document::from_fields("p1", [("title", "refrigerator water filter")]),
//!     Document::from_fields("p2", [("title", "refrigerator water filters")]),
//!     Document::from_fields("p3", [("title", "dryer belt")]),
//! ];
//!
//! let params = IndexParams { num_hashes: 30, bands: 30, k_shingle: 3, seed: 42 };
//! let methods = [MethodSpec::new("title", "title")];
//! let registry = IndexRegistry::build_all(&docs, &methods, &params).unwrap();
//!
//! let similar = registry.query("title", "p1", 10).unwrap();
//! assert_eq!(similar[0], "p2");
//! ```
//!
//! ## Crate Structure
//!
//! - `lshfind-core` - shingling, hash family, signatures, LSH buckets, queries, registry
//! - `lshfind-corpus` - catalog loading and text normalization
//! - `lshfind-api` - REST API

// Re-export core types
pub use lshfind_core::{
    build_index, BandLayout, BucketTable, Document, Error, HashFamily, IndexParams,
    IndexRegistry, IndexStats, LshIndex, MethodSpec, Result, ShingleSet, Shingler,
    SignatureMatrix, SimilarItem,
};

// Re-export corpus
pub use lshfind_corpus::{
    default_methods, normalize_text, resolve_method, Catalog, CatalogConfig, NormalizeConfig,
};

// Re-export API
pub use lshfind_api::{ProductPage, ProductsQuery, RestApi, SimilarRequest};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        build_index, default_methods, Catalog, CatalogConfig, Document, Error, IndexParams,
        IndexRegistry, LshIndex, MethodSpec, Result, RestApi, SimilarItem,
    };
}
