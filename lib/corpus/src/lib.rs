//! # lshfind Corpus
//!
//! Turns raw product catalog records into [`Document`]s the core can index.
//!
//! - [`normalize`] - HTML entity decoding, lowercasing, punctuation and
//!   whitespace cleanup, JSON field flattening
//! - [`catalog`] - JSON / JSON Lines loading, id de-duplication, the
//!   `title`, `description` and `hybrid` text fields, paging over raw
//!   records, short method aliases
//!
//! [`Document`]: lshfind_core::Document

pub mod catalog;
pub mod normalize;

pub use catalog::{
    default_methods, resolve_method, Catalog, CatalogConfig, DESCRIPTION_FIELD, HYBRID_FIELD,
    METHOD_ALIASES, TITLE_FIELD,
};
pub use normalize::{decode_entities, flatten_value, normalize_text, strip_tags, NormalizeConfig};
