//! # lshfind API
//!
//! HTTP boundary for the similarity engine:
//!
//! - `POST /api/similar` - `{mode, product_id, method, k}` to `{results: [ids]}`
//! - `GET /api/methods` - available methods with index statistics
//! - `GET /api/products?page=&per_page=` - one page of product summaries
//! - `GET /api/product/{asin}` - the full product record
//! - `GET /health` - liveness

pub mod rest;

pub use rest::{
    product_page, product_summary, routes, similar_items, ApiError, ProductPage, ProductsQuery,
    RestApi, SimilarRequest,
};
