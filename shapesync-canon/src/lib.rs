//! # shapesync-canon
//!
//! Canonicalization and content hashing for extracted article shapes.
//!
//! A raw shape (the extractor's `.json` sidecar) is validated against a
//! closed per-level field schema, stripped to its catalog-relevant fields,
//! rounded to a fixed geometric precision, order-normalized, and hashed with
//! SHA-256. Two shapes that differ only in text content, display names,
//! word/char statistics, component order, or sub-millimeter geometry noise
//! hash identically; any catalog-relevant difference changes the hash.

pub mod canonical;
pub mod error;
pub mod labels;

pub use canonical::{canonicalize, hash_shape, CanonicalShape, ContentHash};
pub use error::CanonError;
pub use labels::{LabelMapper, RegexLabelMapper};
