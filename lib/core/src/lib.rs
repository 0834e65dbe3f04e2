//! # fabx Core
//!
//! Core library for the fabx fabric catalog search engine.
//!
//! This crate holds the query-compilation and evaluation primitives:
//!
//! - [`FieldCatalog`] - static field classification (numeric / strict text / soft)
//! - [`Criterion`] - normalized operator expression parsed from a raw value
//! - [`CoarseFilter`] - over-approximating storage-level conjunctive filter
//! - [`composition`] - ingredient-percentage parsing and threshold evaluation
//! - [`textmatch`] - AND/OR grouped substring matching
//! - [`RankKey`] - multi-key sort tuple for default ordering
//!
//! ## Example
//!
//! ```rust
//! use fabx_core::composition;
//!
//! assert!(composition::evaluate("65%cotton 35%polyester", "cotton>50%"));
//! assert!(!composition::evaluate("40%cotton 60%polyester", "cotton>50%"));
//! ```

pub mod composition;
pub mod criterion;
pub mod error;
pub mod fields;
pub mod filter;
pub mod rank;
pub mod record;
pub mod textmatch;

pub use criterion::{parse_criterion, parse_numeric, parse_text, CompareOp, Criterion};
pub use error::{Error, Result};
pub use fields::FieldCatalog;
pub use filter::{compile_strict, CoarseFilter, CompiledFilter, FieldPredicate};
pub use rank::{rank_key, RankKey};
pub use record::Record;
